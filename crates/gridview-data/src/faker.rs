// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use gridview_app::Dataset;
use time::macros::datetime;
use time::{Duration, PrimitiveDateTime};

use crate::fixtures::{DataItem, DatasetStatus, data_item_columns};

const SUBJECTS: [&str; 16] = [
    "Customer",
    "Product",
    "Sales",
    "User",
    "Inventory",
    "Billing",
    "Shipment",
    "Marketing",
    "Support",
    "Vendor",
    "Payroll",
    "Session",
    "Order",
    "Pricing",
    "Warehouse",
    "Campaign",
];

const QUALIFIERS: [&str; 10] = [
    "Analytics",
    "Activity",
    "Snapshot",
    "Summary",
    "Events",
    "History",
    "Forecast",
    "Ledger",
    "Metrics",
    "Audit",
];

const SUFFIXES: [&str; 5] = ["Dataset", "Log", "Table", "Feed", "Archive"];
const KINDS: [&str; 3] = ["Table", "View", "Stream"];

const FIRST_NAMES: [&str; 16] = [
    "John", "Jane", "Mike", "Sarah", "Alex", "Maria", "David", "Lisa", "Tom", "Jennifer", "Avery",
    "Jordan", "Riley", "Morgan", "Casey", "Quinn",
];
const LAST_NAMES: [&str; 16] = [
    "Doe", "Smith", "Johnson", "Wilson", "Chen", "Garcia", "Kim", "Thompson", "Park", "Rodriguez",
    "Walker", "Martin", "Evans", "Lopez", "Reed", "Turner",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Reproducible data grid rows. The same seed always yields the same rows, so
/// large generated views can be compared across runs.
#[derive(Debug, Clone)]
pub struct DatasetFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl DatasetFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn data_item(&mut self, id: i64) -> DataItem {
        let name = format!(
            "{} {} {}",
            self.pick(&SUBJECTS),
            self.pick(&QUALIFIERS),
            self.pick(&SUFFIXES)
        );
        let kind = self.pick(&KINDS).to_owned();
        let records = self.int_range(1_000, 25_000_000);
        let status = match self.rng.int_n(20) {
            0 => DatasetStatus::Error,
            1..=3 => DatasetStatus::Processing,
            _ => DatasetStatus::Active,
        };
        let owner = format!("{} {}", self.pick(&FIRST_NAMES), self.pick(&LAST_NAMES));

        DataItem {
            id,
            name,
            kind,
            records,
            size: human_size(records.saturating_mul(self.int_range(120, 900))),
            status,
            last_modified: self.datetime_in_january(),
            owner,
            quality: self.int_range(70, 100),
        }
    }

    pub fn data_items(&mut self, count: usize) -> Vec<DataItem> {
        (1..=count)
            .map(|id| self.data_item(i64::try_from(id).unwrap_or(i64::MAX)))
            .collect()
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }

    fn datetime_in_january(&mut self) -> PrimitiveDateTime {
        let start = datetime!(2024-01-01 0:00);
        let minutes = self.int_range(0, 31 * 24 * 60 - 1);
        start + Duration::minutes(minutes)
    }
}

pub fn generated_dataset(rows: usize, seed: u64) -> Dataset<DataItem> {
    let mut faker = DatasetFaker::new(seed);
    let records = faker.data_items(rows);
    tracing::debug!(rows, seed = faker.seed(), "generated dataset");
    Dataset {
        name: "generated".to_owned(),
        columns: data_item_columns(),
        records,
    }
}

/// Formats a byte count the way the grid fixtures do (`45 MB`, `1.2 GB`).
pub fn human_size(bytes: i64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes.max(0) as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    if unit >= 3 && value < 10.0 {
        format!("{value:.1} {}", UNITS[unit])
    } else {
        format!("{value:.0} {}", UNITS[unit])
    }
}
