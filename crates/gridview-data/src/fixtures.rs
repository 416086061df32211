// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use gridview_app::{ColumnSpec, Dataset, FieldValue, Record, RecordId};
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use time::macros::datetime;

time::serde::format_description!(
    minute_precision,
    PrimitiveDateTime,
    "[year]-[month]-[day] [hour]:[minute]"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatasetStatus {
    Active,
    Processing,
    Error,
}

impl DatasetStatus {
    pub const ALL: [Self; 3] = [Self::Active, Self::Processing, Self::Error];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Processing => "Processing",
            Self::Error => "Error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(value))
    }
}

/// One row of the data grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataItem {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub records: i64,
    pub size: String,
    pub status: DatasetStatus,
    #[serde(with = "minute_precision")]
    pub last_modified: PrimitiveDateTime,
    pub owner: String,
    pub quality: i64,
}

impl Record for DataItem {
    fn id(&self) -> RecordId {
        RecordId::Int(self.id)
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::Integer(self.id)),
            "name" => Some(FieldValue::Text(&self.name)),
            "type" => Some(FieldValue::Text(&self.kind)),
            "records" => Some(FieldValue::Integer(self.records)),
            "size" => Some(FieldValue::Text(&self.size)),
            "status" => Some(FieldValue::Text(self.status.as_str())),
            "last_modified" => Some(FieldValue::DateTime(self.last_modified)),
            "owner" => Some(FieldValue::Text(&self.owner)),
            "quality" => Some(FieldValue::Integer(self.quality)),
            _ => None,
        }
    }
}

pub fn data_item_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("name", "Name").searchable().sortable(),
        ColumnSpec::new("type", "Type").searchable().sortable(),
        ColumnSpec::new("records", "Records").sortable(),
        ColumnSpec::new("size", "Size"),
        ColumnSpec::new("status", "Status").sortable(),
        ColumnSpec::new("last_modified", "Last Modified").sortable(),
        ColumnSpec::new("owner", "Owner").searchable().sortable(),
        ColumnSpec::new("quality", "Quality").sortable(),
    ]
}

#[allow(clippy::too_many_arguments)]
fn data_item(
    id: i64,
    name: &str,
    kind: &str,
    records: i64,
    size: &str,
    status: DatasetStatus,
    last_modified: PrimitiveDateTime,
    owner: &str,
    quality: i64,
) -> DataItem {
    DataItem {
        id,
        name: name.to_owned(),
        kind: kind.to_owned(),
        records,
        size: size.to_owned(),
        status,
        last_modified,
        owner: owner.to_owned(),
        quality,
    }
}

pub fn grid_items() -> Vec<DataItem> {
    vec![
        data_item(
            1,
            "Customer Analytics Dataset",
            "Table",
            2_400_000,
            "1.2 GB",
            DatasetStatus::Active,
            datetime!(2024-01-15 09:30),
            "John Doe",
            98,
        ),
        data_item(
            2,
            "Product Catalog",
            "View",
            85_000,
            "45 MB",
            DatasetStatus::Processing,
            datetime!(2024-01-15 08:15),
            "Jane Smith",
            95,
        ),
        data_item(
            3,
            "Sales Transactions",
            "Table",
            5_600_000,
            "3.8 GB",
            DatasetStatus::Active,
            datetime!(2024-01-14 16:45),
            "Mike Johnson",
            92,
        ),
        data_item(
            4,
            "User Activity Log",
            "Stream",
            12_000_000,
            "890 MB",
            DatasetStatus::Error,
            datetime!(2024-01-14 14:22),
            "Sarah Wilson",
            85,
        ),
        data_item(
            5,
            "Inventory Management",
            "Table",
            150_000,
            "78 MB",
            DatasetStatus::Active,
            datetime!(2024-01-13 11:30),
            "Alex Chen",
            97,
        ),
    ]
}

pub fn grid_dataset() -> Dataset<DataItem> {
    Dataset {
        name: "datasets".to_owned(),
        columns: data_item_columns(),
        records: grid_items(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Database,
    Schema,
    Table,
    View,
    Report,
    Dataset,
}

impl AssetType {
    pub const ALL: [Self; 6] = [
        Self::Database,
        Self::Schema,
        Self::Table,
        Self::View,
        Self::Report,
        Self::Dataset,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Schema => "schema",
            Self::Table => "table",
            Self::View => "view",
            Self::Report => "report",
            Self::Dataset => "dataset",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    Active,
    Deprecated,
    Archived,
}

impl AssetStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Deprecated => "deprecated",
            Self::Archived => "archived",
        }
    }
}

pub const DEPARTMENTS: [&str; 7] = [
    "Analytics",
    "Sales",
    "Product",
    "Finance",
    "Marketing",
    "IT",
    "Operations",
];

/// A data catalog entry. `last_modified` and `records` are display strings
/// such as `2 hours ago` and `50M+`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogAsset {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AssetType,
    pub description: String,
    pub owner: String,
    pub department: String,
    pub last_modified: String,
    pub size: String,
    pub records: String,
    pub status: AssetStatus,
    pub tags: Vec<String>,
    pub rating: f64,
    pub usage: String,
    pub classification: String,
    pub quality: i64,
    pub popularity: i64,
}

impl Record for CatalogAsset {
    fn id(&self) -> RecordId {
        RecordId::Text(self.id.clone())
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::Text(&self.id)),
            "name" => Some(FieldValue::Text(&self.name)),
            "type" => Some(FieldValue::Text(self.kind.as_str())),
            "description" => Some(FieldValue::Text(&self.description)),
            "owner" => Some(FieldValue::Text(&self.owner)),
            "department" => Some(FieldValue::Text(&self.department)),
            "last_modified" => Some(FieldValue::Text(&self.last_modified)),
            "size" => Some(FieldValue::Text(&self.size)),
            "records" => Some(FieldValue::Text(&self.records)),
            "status" => Some(FieldValue::Text(self.status.as_str())),
            "tags" => Some(FieldValue::List(&self.tags)),
            "rating" => Some(FieldValue::Number(self.rating)),
            "usage" => Some(FieldValue::Text(&self.usage)),
            "classification" => Some(FieldValue::Text(&self.classification)),
            "quality" => Some(FieldValue::Integer(self.quality)),
            "popularity" => Some(FieldValue::Integer(self.popularity)),
            _ => None,
        }
    }

    fn sort_field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "last_modified" => match age_minutes(&self.last_modified) {
                Some(age) => Some(FieldValue::Integer(-age)),
                None => self.field(name),
            },
            _ => self.field(name),
        }
    }
}

/// Minutes behind now for labels like `30 minutes ago` or `2 weeks ago`.
pub fn age_minutes(label: &str) -> Option<i64> {
    let label = label.trim();
    if label.eq_ignore_ascii_case("just now") {
        return Some(0);
    }
    let mut parts = label.split_whitespace();
    let count: i64 = parts.next()?.parse().ok()?;
    let unit = parts.next()?;
    if parts.next() != Some("ago") || parts.next().is_some() {
        return None;
    }
    let minutes = match unit.trim_end_matches('s') {
        "minute" => 1,
        "hour" => 60,
        "day" => 60 * 24,
        "week" => 60 * 24 * 7,
        "month" => 60 * 24 * 30,
        "year" => 60 * 24 * 365,
        _ => return None,
    };
    count.checked_mul(minutes)
}

pub fn catalog_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("name", "Name").searchable().sortable(),
        ColumnSpec::new("type", "Type").sortable(),
        ColumnSpec::new("department", "Department").sortable(),
        ColumnSpec::new("owner", "Owner").sortable(),
        ColumnSpec::new("status", "Status").sortable(),
        ColumnSpec::new("rating", "Rating").sortable(),
        ColumnSpec::new("quality", "Quality").sortable(),
        ColumnSpec::new("popularity", "Popularity").sortable(),
        ColumnSpec::new("usage", "Usage"),
        ColumnSpec::new("classification", "Class"),
        ColumnSpec::new("size", "Size"),
        ColumnSpec::new("records", "Records"),
        ColumnSpec::new("last_modified", "Modified").sortable(),
        ColumnSpec::new("tags", "Tags").searchable(),
        ColumnSpec::new("description", "Description").searchable(),
    ]
}

struct AssetSeed {
    id: &'static str,
    name: &'static str,
    kind: AssetType,
    description: &'static str,
    owner: &'static str,
    department: &'static str,
    last_modified: &'static str,
    size: &'static str,
    records: &'static str,
    status: AssetStatus,
    tags: [&'static str; 4],
    rating: f64,
    usage: &'static str,
    classification: &'static str,
    quality: i64,
    popularity: i64,
}

impl AssetSeed {
    fn build(&self) -> CatalogAsset {
        CatalogAsset {
            id: self.id.to_owned(),
            name: self.name.to_owned(),
            kind: self.kind,
            description: self.description.to_owned(),
            owner: self.owner.to_owned(),
            department: self.department.to_owned(),
            last_modified: self.last_modified.to_owned(),
            size: self.size.to_owned(),
            records: self.records.to_owned(),
            status: self.status,
            tags: self.tags.iter().map(|tag| (*tag).to_owned()).collect(),
            rating: self.rating,
            usage: self.usage.to_owned(),
            classification: self.classification.to_owned(),
            quality: self.quality,
            popularity: self.popularity,
        }
    }
}

const CATALOG_SEEDS: [AssetSeed; 8] = [
    AssetSeed {
        id: "1",
        name: "Customer Analytics Database",
        kind: AssetType::Database,
        description: "Comprehensive customer behavior and analytics data warehouse",
        owner: "Sarah Chen",
        department: "Analytics",
        last_modified: "2 hours ago",
        size: "2.4 TB",
        records: "50M+",
        status: AssetStatus::Active,
        tags: ["customer", "analytics", "production", "high-value"],
        rating: 4.8,
        usage: "High",
        classification: "internal",
        quality: 98,
        popularity: 95,
    },
    AssetSeed {
        id: "2",
        name: "Sales Pipeline Schema",
        kind: AssetType::Schema,
        description: "Sales opportunities, leads, and conversion tracking schema",
        owner: "Mike Rodriguez",
        department: "Sales",
        last_modified: "30 minutes ago",
        size: "456 GB",
        records: "12M+",
        status: AssetStatus::Active,
        tags: ["sales", "pipeline", "crm", "revenue"],
        rating: 4.6,
        usage: "High",
        classification: "confidential",
        quality: 96,
        popularity: 88,
    },
    AssetSeed {
        id: "3",
        name: "Product Catalog Table",
        kind: AssetType::Table,
        description: "Complete product information including pricing and inventory",
        owner: "Jennifer Park",
        department: "Product",
        last_modified: "1 hour ago",
        size: "234 GB",
        records: "2M+",
        status: AssetStatus::Active,
        tags: ["product", "catalog", "inventory", "pricing"],
        rating: 4.4,
        usage: "Medium",
        classification: "internal",
        quality: 94,
        popularity: 78,
    },
    AssetSeed {
        id: "4",
        name: "User Engagement View",
        kind: AssetType::View,
        description: "Aggregated user engagement metrics and session data",
        owner: "David Kim",
        department: "Product",
        last_modified: "4 hours ago",
        size: "89 GB",
        records: "8M+",
        status: AssetStatus::Active,
        tags: ["user", "engagement", "analytics", "sessions"],
        rating: 4.7,
        usage: "High",
        classification: "internal",
        quality: 97,
        popularity: 92,
    },
    AssetSeed {
        id: "5",
        name: "Financial Reports Dataset",
        kind: AssetType::Dataset,
        description: "Quarterly and annual financial reporting data",
        owner: "Lisa Thompson",
        department: "Finance",
        last_modified: "1 day ago",
        size: "123 GB",
        records: "500K+",
        status: AssetStatus::Active,
        tags: ["finance", "reports", "compliance", "quarterly"],
        rating: 4.5,
        usage: "Medium",
        classification: "restricted",
        quality: 99,
        popularity: 65,
    },
    AssetSeed {
        id: "6",
        name: "Marketing Campaign Table",
        kind: AssetType::Table,
        description: "Marketing campaign performance and ROI tracking",
        owner: "Tom Wilson",
        department: "Marketing",
        last_modified: "3 hours ago",
        size: "67 GB",
        records: "3M+",
        status: AssetStatus::Active,
        tags: ["marketing", "campaigns", "roi", "performance"],
        rating: 4.3,
        usage: "Medium",
        classification: "internal",
        quality: 92,
        popularity: 71,
    },
    AssetSeed {
        id: "7",
        name: "Legacy CRM Database",
        kind: AssetType::Database,
        description: "Historical customer relationship management data",
        owner: "Alex Chen",
        department: "IT",
        last_modified: "2 weeks ago",
        size: "890 GB",
        records: "25M+",
        status: AssetStatus::Deprecated,
        tags: ["legacy", "crm", "historical", "migration"],
        rating: 3.2,
        usage: "Low",
        classification: "internal",
        quality: 78,
        popularity: 23,
    },
    AssetSeed {
        id: "8",
        name: "Supply Chain Analytics",
        kind: AssetType::Report,
        description: "Supply chain optimization and vendor performance analytics",
        owner: "Maria Garcia",
        department: "Operations",
        last_modified: "5 hours ago",
        size: "45 GB",
        records: "1M+",
        status: AssetStatus::Active,
        tags: ["supply-chain", "logistics", "vendors", "optimization"],
        rating: 4.6,
        usage: "High",
        classification: "confidential",
        quality: 95,
        popularity: 84,
    },
];

pub fn catalog_assets() -> Vec<CatalogAsset> {
    CATALOG_SEEDS.iter().map(AssetSeed::build).collect()
}

pub fn catalog_dataset() -> Dataset<CatalogAsset> {
    Dataset {
        name: "catalog".to_owned(),
        columns: catalog_columns(),
        records: catalog_assets(),
    }
}
