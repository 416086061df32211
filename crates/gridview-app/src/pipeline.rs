// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Derived-view pipeline: search, facet filtering and stable sorting over a
//! borrowed record slice. Every function here is pure; results are indices into
//! the caller's slice so records are never cloned or mutated.

use std::cmp::Ordering;

use crate::model::{FieldValue, Record, SortDirection};

/// Facet value that disables a facet, matching the catalog selectors.
pub const FACET_ALL: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_owned(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_owned(),
            direction: SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetFilter {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewParameters {
    pub search_term: String,
    pub sort: Option<SortSpec>,
    pub facets: Vec<FacetFilter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PipelineConfig {
    pub searchable_fields: Vec<String>,
}

impl PipelineConfig {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            searchable_fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// `lowered_term` must already be lowercase; an empty term matches everything.
pub fn matches_search<R: Record>(record: &R, fields: &[String], lowered_term: &str) -> bool {
    if lowered_term.is_empty() {
        return true;
    }
    fields.iter().any(|field| {
        record
            .field(field)
            .is_some_and(|value| value.contains_lowercase(lowered_term))
    })
}

pub fn matches_facets<R: Record>(record: &R, facets: &[FacetFilter]) -> bool {
    facets.iter().all(|facet| {
        if facet.value.eq_ignore_ascii_case(FACET_ALL) {
            return true;
        }
        let wanted = facet.value.to_lowercase();
        match record.field(&facet.field) {
            Some(FieldValue::List(values)) => {
                values.iter().any(|value| value.to_lowercase() == wanted)
            }
            Some(value) => value.display().to_lowercase() == wanted,
            None => false,
        }
    })
}

pub fn filter_indices<R: Record>(
    source: &[R],
    params: &ViewParameters,
    config: &PipelineConfig,
) -> Vec<usize> {
    let lowered = params.search_term.to_lowercase();
    source
        .iter()
        .enumerate()
        .filter(|(_, record)| {
            matches_facets(*record, &params.facets)
                && matches_search(*record, &config.searchable_fields, &lowered)
        })
        .map(|(index, _)| index)
        .collect()
}

/// Stable: records that compare equal keep their incoming relative order.
pub fn sort_indices<R: Record>(source: &[R], indices: &mut [usize], sort: &SortSpec) {
    indices.sort_by(|left, right| compare_records(&source[*left], &source[*right], sort));
}

pub fn derive_sequence<R: Record>(
    source: &[R],
    params: &ViewParameters,
    config: &PipelineConfig,
) -> Vec<usize> {
    let mut indices = filter_indices(source, params, config);
    if let Some(sort) = &params.sort {
        sort_indices(source, &mut indices, sort);
    }
    tracing::trace!(
        source = source.len(),
        derived = indices.len(),
        sort = params.sort.as_ref().map(|sort| sort.column.as_str()),
        "derived sequence rebuilt"
    );
    indices
}

pub fn derive_records<'a, R: Record>(
    source: &'a [R],
    params: &ViewParameters,
    config: &PipelineConfig,
) -> Vec<&'a R> {
    derive_sequence(source, params, config)
        .into_iter()
        .map(|index| &source[index])
        .collect()
}

/// Records missing the sort field sort after every record that has it, in
/// either direction, and tie with each other.
pub fn compare_records<R: Record>(left: &R, right: &R, sort: &SortSpec) -> Ordering {
    match (left.sort_field(&sort.column), right.sort_field(&sort.column)) {
        (Some(left), Some(right)) => match sort.direction {
            SortDirection::Asc => compare_values(&left, &right),
            SortDirection::Desc => compare_values(&left, &right).reverse(),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Total order over field values. Numbers compare numerically across integer
/// and float; values of different kinds order by kind.
pub fn compare_values(left: &FieldValue<'_>, right: &FieldValue<'_>) -> Ordering {
    match (left, right) {
        (FieldValue::Integer(left), FieldValue::Integer(right)) => left.cmp(right),
        (FieldValue::Text(left), FieldValue::Text(right)) => compare_text(left, right),
        (FieldValue::DateTime(left), FieldValue::DateTime(right)) => left.cmp(right),
        (FieldValue::List(left), FieldValue::List(right)) => {
            compare_text(&left.join(", "), &right.join(", "))
        }
        (FieldValue::Number(left), FieldValue::Number(right)) => compare_floats(*left, *right),
        (FieldValue::Integer(left), FieldValue::Number(right)) => compare_int_float(*left, *right),
        (FieldValue::Number(left), FieldValue::Integer(right)) => {
            compare_int_float(*right, *left).reverse()
        }
        _ => kind_rank(left).cmp(&kind_rank(right)),
    }
}

/// `-0.0` equals `0.0` so that both equal integer zero; NaN sorts by sign
/// past every real number.
fn compare_floats(left: f64, right: f64) -> Ordering {
    left.partial_cmp(&right)
        .unwrap_or_else(|| left.total_cmp(&right))
}

/// Exact comparison without rounding the integer through `f64`.
fn compare_int_float(int: i64, float: f64) -> Ordering {
    if float.is_nan() {
        return if float.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    // 2^63 is exactly representable; anything at or beyond it is out of i64 range.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if float >= LIMIT {
        return Ordering::Less;
    }
    if float < -LIMIT {
        return Ordering::Greater;
    }
    let whole = float.trunc();
    (int as i128)
        .cmp(&(whole as i128))
        .then_with(|| 0.0_f64.partial_cmp(&(float - whole)).unwrap_or(Ordering::Equal))
}

/// Case-insensitive first; on a tie lowercase sorts before uppercase, the way
/// locale collation orders `a` before `A`.
pub fn compare_text(left: &str, right: &str) -> Ordering {
    left.to_lowercase()
        .cmp(&right.to_lowercase())
        .then_with(|| right.cmp(left))
}

fn kind_rank(value: &FieldValue<'_>) -> u8 {
    match value {
        FieldValue::Integer(_) | FieldValue::Number(_) => 0,
        FieldValue::DateTime(_) => 1,
        FieldValue::Text(_) => 2,
        FieldValue::List(_) => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        FacetFilter, PipelineConfig, SortSpec, ViewParameters, compare_text, compare_values,
        derive_records, derive_sequence,
    };
    use crate::model::{DynamicRecord, FieldValue, Record, Value};
    use crate::{RecordId, SortDirection};
    use proptest::prelude::*;
    use std::cmp::Ordering;

    fn dataset(id: i64, name: &str, kind: &str, owner: &str, records: i64) -> DynamicRecord {
        DynamicRecord::new(id)
            .with("name", Value::Text(name.to_owned()))
            .with("type", Value::Text(kind.to_owned()))
            .with("owner", Value::Text(owner.to_owned()))
            .with("records", Value::Integer(records))
    }

    fn grid_records() -> Vec<DynamicRecord> {
        vec![
            dataset(1, "Customer Analytics Dataset", "Table", "John Doe", 2_400_000),
            dataset(2, "Product Catalog", "View", "Jane Smith", 85_000),
            dataset(3, "Sales Transactions", "Table", "Mike Johnson", 5_600_000),
            dataset(4, "User Activity Log", "Stream", "Sarah Wilson", 12_000_000),
            dataset(5, "Inventory Management", "Table", "Alex Chen", 150_000),
        ]
    }

    fn grid_config() -> PipelineConfig {
        PipelineConfig::new(["name", "type", "owner"])
    }

    fn names(records: &[&DynamicRecord]) -> Vec<String> {
        records
            .iter()
            .filter_map(|record| record.field("name").map(|value| value.display()))
            .collect()
    }

    fn ids(records: &[&DynamicRecord]) -> Vec<RecordId> {
        records.iter().map(|record| record.id()).collect()
    }

    #[test]
    fn search_matches_name_substring_case_insensitively() {
        let source = grid_records();
        let params = ViewParameters {
            search_term: "data".to_owned(),
            ..ViewParameters::default()
        };
        let output = derive_records(&source, &params, &grid_config());
        assert_eq!(names(&output), vec!["Customer Analytics Dataset"]);
    }

    #[test]
    fn search_checks_every_searchable_field() {
        let source = grid_records();
        let params = ViewParameters {
            search_term: "TABLE".to_owned(),
            ..ViewParameters::default()
        };
        let output = derive_records(&source, &params, &grid_config());
        assert_eq!(
            ids(&output),
            vec![RecordId::Int(1), RecordId::Int(3), RecordId::Int(5)]
        );

        let by_owner = ViewParameters {
            search_term: "chen".to_owned(),
            ..ViewParameters::default()
        };
        let output = derive_records(&source, &by_owner, &grid_config());
        assert_eq!(ids(&output), vec![RecordId::Int(5)]);
    }

    #[test]
    fn search_ignores_fields_that_are_not_configured() {
        let source = grid_records();
        let params = ViewParameters {
            search_term: "john".to_owned(),
            ..ViewParameters::default()
        };
        let output = derive_records(&source, &params, &PipelineConfig::new(["name"]));
        assert!(output.is_empty());
    }

    #[test]
    fn empty_search_and_no_sort_is_a_pass_through() {
        let source = grid_records();
        let output = derive_sequence(&source, &ViewParameters::default(), &grid_config());
        assert_eq!(output, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn numeric_sort_ascending_orders_by_value() {
        let source = vec![
            DynamicRecord::new(1).with("records", Value::Integer(5_600_000)),
            DynamicRecord::new(2).with("records", Value::Integer(85_000)),
        ];
        let params = ViewParameters {
            sort: Some(SortSpec::asc("records")),
            ..ViewParameters::default()
        };
        let output = derive_records(&source, &params, &PipelineConfig::default());
        assert_eq!(ids(&output), vec![RecordId::Int(2), RecordId::Int(1)]);
    }

    #[test]
    fn text_sort_descending_is_case_insensitive() {
        let source = grid_records();
        let params = ViewParameters {
            sort: Some(SortSpec::desc("name")),
            ..ViewParameters::default()
        };
        let output = derive_records(&source, &params, &grid_config());
        assert_eq!(
            names(&output),
            vec![
                "User Activity Log",
                "Sales Transactions",
                "Product Catalog",
                "Inventory Management",
                "Customer Analytics Dataset",
            ]
        );
    }

    #[test]
    fn sort_after_filter_only_reorders_matches() {
        let source = grid_records();
        let params = ViewParameters {
            search_term: "table".to_owned(),
            sort: Some(SortSpec::desc("records")),
            ..ViewParameters::default()
        };
        let output = derive_records(&source, &params, &grid_config());
        assert_eq!(
            ids(&output),
            vec![RecordId::Int(3), RecordId::Int(1), RecordId::Int(5)]
        );
    }

    #[test]
    fn missing_sort_field_sorts_last_in_both_directions() {
        let source = vec![
            DynamicRecord::new(1),
            DynamicRecord::new(2).with("quality", Value::Integer(90)),
            DynamicRecord::new(3),
            DynamicRecord::new(4).with("quality", Value::Integer(97)),
        ];
        for (sort, expected) in [
            (SortSpec::asc("quality"), vec![2, 4, 1, 3]),
            (SortSpec::desc("quality"), vec![4, 2, 1, 3]),
        ] {
            let params = ViewParameters {
                sort: Some(sort),
                ..ViewParameters::default()
            };
            let output = derive_records(&source, &params, &PipelineConfig::default());
            let expected = expected.into_iter().map(RecordId::Int).collect::<Vec<_>>();
            assert_eq!(ids(&output), expected);
        }
    }

    #[test]
    fn facets_restrict_by_exact_value_and_all_disables_them() {
        let source = grid_records();
        let params = ViewParameters {
            facets: vec![FacetFilter {
                field: "type".to_owned(),
                value: "table".to_owned(),
            }],
            ..ViewParameters::default()
        };
        assert_eq!(derive_sequence(&source, &params, &grid_config()), vec![0, 2, 4]);

        let all = ViewParameters {
            facets: vec![FacetFilter {
                field: "type".to_owned(),
                value: "all".to_owned(),
            }],
            ..ViewParameters::default()
        };
        assert_eq!(derive_sequence(&source, &all, &grid_config()).len(), 5);
    }

    #[test]
    fn source_is_left_untouched() {
        let source = grid_records();
        let before = source.clone();
        let params = ViewParameters {
            search_term: "a".to_owned(),
            sort: Some(SortSpec::desc("records")),
            ..ViewParameters::default()
        };
        let _ = derive_sequence(&source, &params, &grid_config());
        assert_eq!(source, before);
    }

    #[test]
    fn compare_values_mixes_integer_and_float_numerically() {
        assert_eq!(
            compare_values(&FieldValue::Integer(4), &FieldValue::Number(4.5)),
            Ordering::Less
        );
        assert_eq!(
            compare_values(&FieldValue::Number(4.8), &FieldValue::Integer(4)),
            Ordering::Greater
        );
        assert_eq!(
            compare_values(&FieldValue::Integer(1), &FieldValue::Text("1")),
            Ordering::Less
        );
    }

    #[test]
    fn compare_values_is_exact_for_integers_beyond_float_precision() {
        let big = 1_i64 << 53;
        let a = FieldValue::Integer(big);
        let b = FieldValue::Integer(big + 1);
        let c = FieldValue::Number(big as f64);
        assert_eq!(compare_values(&a, &b), Ordering::Less);
        assert_eq!(compare_values(&a, &c), Ordering::Equal);
        assert_eq!(compare_values(&b, &c), Ordering::Greater);
        assert_eq!(compare_values(&c, &b), Ordering::Less);

        assert_eq!(
            compare_values(&FieldValue::Integer(-4), &FieldValue::Number(-4.5)),
            Ordering::Greater
        );
        assert_eq!(
            compare_values(&FieldValue::Integer(i64::MAX), &FieldValue::Number(1e19)),
            Ordering::Less
        );
        assert_eq!(
            compare_values(&FieldValue::Integer(0), &FieldValue::Number(-0.0)),
            Ordering::Equal
        );
        assert_eq!(
            compare_values(&FieldValue::Number(-0.0), &FieldValue::Number(0.0)),
            Ordering::Equal
        );
        assert_eq!(
            compare_values(&FieldValue::Integer(i64::MAX), &FieldValue::Number(f64::NAN)),
            Ordering::Less
        );
    }

    #[test]
    fn sorting_mixed_numbers_near_float_precision_is_consistent() {
        let big = 1_i64 << 53;
        let source = vec![
            DynamicRecord::new(1).with("n", Value::Integer(big + 1)),
            DynamicRecord::new(2).with("n", Value::Number(big as f64)),
            DynamicRecord::new(3).with("n", Value::Integer(big)),
            DynamicRecord::new(4).with("n", Value::Number(1.5)),
        ];
        let params = ViewParameters {
            sort: Some(SortSpec::asc("n")),
            ..ViewParameters::default()
        };
        let ids = derive_records(&source, &params, &PipelineConfig::default())
            .iter()
            .map(|record| record.id())
            .collect::<Vec<_>>();
        assert_eq!(
            ids,
            vec![
                RecordId::Int(4),
                RecordId::Int(2),
                RecordId::Int(3),
                RecordId::Int(1)
            ]
        );
    }

    #[test]
    fn compare_text_puts_lowercase_first_on_case_ties() {
        assert_eq!(compare_text("alpha", "Beta"), Ordering::Less);
        assert_eq!(compare_text("a", "A"), Ordering::Less);
        assert_eq!(compare_text("Same", "Same"), Ordering::Equal);
    }

    fn arb_records() -> impl Strategy<Value = Vec<DynamicRecord>> {
        prop::collection::vec(
            (
                "[a-dA-D]{0,4}",
                prop::option::of(0_i64..5),
                prop::option::of("[a-cA-C]{1,2}"),
            ),
            0..40,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(index, (name, score, label))| {
                    let mut record = DynamicRecord::new(index as i64)
                        .with("name", Value::Text(name));
                    if let Some(score) = score {
                        record = record.with("score", Value::Integer(score));
                    }
                    if let Some(label) = label {
                        record = record.with("label", Value::Text(label));
                    }
                    record
                })
                .collect()
        })
    }

    fn arb_direction() -> impl Strategy<Value = SortDirection> {
        prop_oneof![Just(SortDirection::Asc), Just(SortDirection::Desc)]
    }

    proptest! {
        #[test]
        fn filter_returns_exactly_the_matching_records(
            source in arb_records(),
            term in "[a-dA-D]{0,2}",
        ) {
            let params = ViewParameters { search_term: term.clone(), ..ViewParameters::default() };
            let config = PipelineConfig::new(["name", "label"]);
            let output = derive_sequence(&source, &params, &config);
            let lowered = term.to_lowercase();
            let expected = source
                .iter()
                .enumerate()
                .filter(|(_, record)| {
                    ["name", "label"].iter().any(|field| {
                        record
                            .field(field)
                            .is_some_and(|value| value.display().to_lowercase().contains(&lowered))
                    })
                })
                .map(|(index, _)| index)
                .collect::<Vec<_>>();
            prop_assert_eq!(output, expected);
        }

        #[test]
        fn sort_is_stable_for_equal_keys(
            source in arb_records(),
            column in prop_oneof![Just("score"), Just("label")],
            direction in arb_direction(),
        ) {
            let params = ViewParameters {
                sort: Some(SortSpec { column: column.to_owned(), direction }),
                ..ViewParameters::default()
            };
            let output = derive_sequence(&source, &params, &PipelineConfig::default());
            for pair in output.windows(2) {
                let order = super::compare_records(
                    &source[pair[0]],
                    &source[pair[1]],
                    params.sort.as_ref().expect("sort set above"),
                );
                if order == Ordering::Equal {
                    prop_assert!(pair[0] < pair[1]);
                }
            }
        }

        #[test]
        fn sort_output_is_ordered_under_the_comparator(
            source in arb_records(),
            direction in arb_direction(),
        ) {
            let params = ViewParameters {
                sort: Some(SortSpec { column: "score".to_owned(), direction }),
                ..ViewParameters::default()
            };
            let output = derive_sequence(&source, &params, &PipelineConfig::default());
            prop_assert_eq!(output.len(), source.len());
            let scores = output
                .iter()
                .filter_map(|index| source[*index].field("score").and_then(|value| value.as_number()))
                .collect::<Vec<_>>();
            for pair in scores.windows(2) {
                match direction {
                    SortDirection::Asc => prop_assert!(pair[0] <= pair[1]),
                    SortDirection::Desc => prop_assert!(pair[0] >= pair[1]),
                }
            }
            let first_missing = output
                .iter()
                .position(|index| source[*index].field("score").is_none())
                .unwrap_or(output.len());
            prop_assert!(output[first_missing..]
                .iter()
                .all(|index| source[*index].field("score").is_none()));
        }
    }
}
