//! Row derivation pipeline for the grid engine.
//!
//! Everything here is a pure function of its inputs: the caller's rows are
//! never reordered or mutated, and derived orders are expressed as indices
//! into the input slice.

use super::models::{Row, SortDirection, SortSpec, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Column key to case-insensitive substring query.
pub type FilterMap = BTreeMap<String, String>;

/// A named partition of the derived list.
#[derive(Debug, Clone, PartialEq)]
pub struct RowGroup {
    /// String-coerced field value shared by every member
    pub key: String,
    /// Positions in the derived list, in derived order
    pub members: Vec<usize>,
}

impl RowGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Returns whether `row` satisfies every non-empty filter.
///
/// Matching is a case-insensitive substring test against the string form of
/// the field. Missing and null fields never satisfy a non-empty query.
pub fn matches_filters(row: &Row, filters: &FilterMap) -> bool {
    filters
        .iter()
        .filter(|(_, query)| !query.is_empty())
        .all(|(key, query)| match row.get(key) {
            None | Some(Value::Null) => false,
            Some(value) => value.to_string().to_lowercase().contains(&query.to_lowercase()),
        })
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Bool(_) => 0,
        Value::Number(_) => 1,
        Value::Text(_) => 2,
        Value::Null => 3,
    }
}

/// Orders two field values for the given direction.
///
/// Present values compare natively (numbers numerically, text
/// lexicographically, `false < true`); mixed kinds order
/// `bool < number < text`. Missing and null values sort last in both
/// directions.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>, direction: SortDirection) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());

    let ordering = match (a, b) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Greater,
        (Some(_), None) => return Ordering::Less,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            (Value::Number(x), Value::Number(y)) => x.total_cmp(y),
            (Value::Text(x), Value::Text(y)) => x.cmp(y),
            _ => kind_rank(a).cmp(&kind_rank(b)),
        },
    };

    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

/// Computes the derived order: filtered first, then stably sorted.
///
/// ```
/// use agrigrid::domain::{derive_order, FilterMap, Row, SortDirection, SortSpec, Value};
///
/// let rows = vec![
///     Row::from_pairs([("name", Value::from("Alice")), ("age", Value::from(30))]),
///     Row::from_pairs([("name", Value::from("Bob")), ("age", Value::from(25))]),
/// ];
/// let order = derive_order(&rows, &FilterMap::new(), Some(&SortSpec::new("age", SortDirection::Asc)));
/// assert_eq!(order, vec![1, 0]);
/// ```
pub fn derive_order(rows: &[Row], filters: &FilterMap, sort: Option<&SortSpec>) -> Vec<usize> {
    let mut order: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| matches_filters(row, filters))
        .map(|(index, _)| index)
        .collect();

    if let Some(sort) = sort {
        order.sort_by(|&a, &b| {
            compare_values(rows[a].get(&sort.column), rows[b].get(&sort.column), sort.direction)
        });
    }

    order
}

/// Same as [`derive_order`], materialized as row references.
pub fn derive_rows<'a>(rows: &'a [Row], filters: &FilterMap, sort: Option<&SortSpec>) -> Vec<&'a Row> {
    derive_order(rows, filters, sort)
        .into_iter()
        .map(|index| &rows[index])
        .collect()
}

/// Partitions the derived list by the string form of `key`.
///
/// Groups appear in first-seen order and every derived position lands in
/// exactly one group. Rows lacking the field fall into `"undefined"`.
pub fn group_rows(rows: &[Row], derived: &[usize], key: &str) -> Vec<RowGroup> {
    let mut groups: Vec<RowGroup> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (position, &row_index) in derived.iter().enumerate() {
        let Some(row) = rows.get(row_index) else {
            continue;
        };
        let group_key = Value::coerce(row.get(key));
        match positions.get(&group_key) {
            Some(&slot) => groups[slot].members.push(position),
            None => {
                positions.insert(group_key.clone(), groups.len());
                groups.push(RowGroup {
                    key: group_key,
                    members: vec![position],
                });
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(name: &str, age: i64) -> Row {
        Row::from_pairs([("name", Value::from(name)), ("age", Value::from(age))])
    }

    fn people() -> Vec<Row> {
        vec![person("Alice", 30), person("Bob", 25)]
    }

    fn filters(pairs: &[(&str, &str)]) -> FilterMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_sort_by_age_ascending() {
        let rows = people();
        let sort = SortSpec::new("age", SortDirection::Asc);
        let derived = derive_rows(&rows, &FilterMap::new(), Some(&sort));
        let names: Vec<String> = derived.iter().map(|r| Value::coerce(r.get("name"))).collect();
        assert_eq!(names, vec!["Bob", "Alice"]);
    }

    #[test]
    fn test_filter_is_case_insensitive_substring() {
        let rows = people();
        let derived = derive_rows(&rows, &filters(&[("name", "ali")]), None);
        assert_eq!(derived, vec![&rows[0]]);

        let derived = derive_rows(&rows, &filters(&[("name", "O")]), None);
        assert_eq!(derived, vec![&rows[1]]);
    }

    #[test]
    fn test_filters_combine_with_and() {
        let rows = vec![person("Alice", 30), person("Alina", 25), person("Bob", 30)];
        let order = derive_order(&rows, &filters(&[("name", "al"), ("age", "30")]), None);
        assert_eq!(order, vec![0]);
    }

    #[test]
    fn test_empty_query_means_no_filter() {
        let rows = people();
        let order = derive_order(&rows, &filters(&[("name", "")]), None);
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn test_filter_on_numbers_uses_string_form() {
        let rows = vec![person("A", 1250), person("B", 300)];
        let order = derive_order(&rows, &filters(&[("age", "25")]), None);
        assert_eq!(order, vec![0]);
    }

    #[test]
    fn test_filter_on_unknown_key_matches_nothing() {
        let rows = people();
        let order = derive_order(&rows, &filters(&[("region", "x")]), None);
        assert!(order.is_empty());
    }

    #[test]
    fn test_missing_and_null_values_fail_filters() {
        let rows = vec![
            Row::from_pairs([("name", Value::Null)]),
            Row::new(),
            Row::from_pairs([("name", Value::from("null"))]),
        ];
        let order = derive_order(&rows, &filters(&[("name", "nul")]), None);
        assert_eq!(order, vec![2]);
    }

    #[test]
    fn test_sort_descending_reverses() {
        let rows = vec![person("A", 2), person("B", 9), person("C", 5)];
        let sort = SortSpec::new("age", SortDirection::Desc);
        let order = derive_order(&rows, &FilterMap::new(), Some(&sort));
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn test_sort_numbers_numerically_not_lexically() {
        let rows = vec![person("A", 100), person("B", 9), person("C", 20)];
        let sort = SortSpec::new("age", SortDirection::Asc);
        let order = derive_order(&rows, &FilterMap::new(), Some(&sort));
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let rows = vec![person("A", 1), person("B", 0), person("C", 1), person("D", 0)];
        let asc = SortSpec::new("age", SortDirection::Asc);
        assert_eq!(derive_order(&rows, &FilterMap::new(), Some(&asc)), vec![1, 3, 0, 2]);

        let desc = SortSpec::new("age", SortDirection::Desc);
        assert_eq!(derive_order(&rows, &FilterMap::new(), Some(&desc)), vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_nulls_sort_last_in_both_directions() {
        let rows = vec![
            Row::from_pairs([("v", Value::Null)]),
            Row::from_pairs([("v", Value::from(3))]),
            Row::new(),
            Row::from_pairs([("v", Value::from(1))]),
        ];
        let asc = SortSpec::new("v", SortDirection::Asc);
        assert_eq!(derive_order(&rows, &FilterMap::new(), Some(&asc)), vec![3, 1, 0, 2]);

        let desc = SortSpec::new("v", SortDirection::Desc);
        assert_eq!(derive_order(&rows, &FilterMap::new(), Some(&desc)), vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_mixed_kinds_have_consistent_order() {
        let a = Value::from(true);
        let b = Value::from(5);
        let c = Value::from("text");
        assert_eq!(compare_values(Some(&a), Some(&b), SortDirection::Asc), Ordering::Less);
        assert_eq!(compare_values(Some(&b), Some(&c), SortDirection::Asc), Ordering::Less);
        assert_eq!(compare_values(Some(&c), Some(&a), SortDirection::Desc), Ordering::Less);
    }

    #[test]
    fn test_sort_result_is_ordered_pairwise() {
        let rows: Vec<Row> = [7, 3, 9, 1, 3, 8, 2]
            .iter()
            .enumerate()
            .map(|(i, age)| person(&format!("p{}", i), *age))
            .collect();
        let asc = SortSpec::new("age", SortDirection::Asc);
        let order = derive_order(&rows, &FilterMap::new(), Some(&asc));
        for pair in order.windows(2) {
            let a = rows[pair[0]].get("age").and_then(Value::as_f64).unwrap();
            let b = rows[pair[1]].get("age").and_then(Value::as_f64).unwrap();
            assert!(a <= b);
        }
    }

    #[test]
    fn test_filter_applies_before_sort() {
        let rows = vec![person("Zed", 5), person("Amy", 40), person("Zoe", 1)];
        let sort = SortSpec::new("age", SortDirection::Asc);
        let order = derive_order(&rows, &filters(&[("name", "z")]), Some(&sort));
        assert_eq!(order, vec![2, 0]);
    }

    #[test]
    fn test_derive_does_not_mutate_input() {
        let rows = vec![person("B", 2), person("A", 1)];
        let before = rows.clone();
        let _ = derive_order(&rows, &FilterMap::new(), Some(&SortSpec::new("age", SortDirection::Asc)));
        assert_eq!(rows, before);
    }

    #[test]
    fn test_group_by_status() {
        let rows: Vec<Row> = ["active", "active", "closed"]
            .iter()
            .map(|s| Row::from_pairs([("status", Value::from(*s))]))
            .collect();
        let derived = derive_order(&rows, &FilterMap::new(), None);
        let groups = group_rows(&rows, &derived, "status");

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "active");
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[1].key, "closed");
        assert_eq!(groups[1].members, vec![2]);
    }

    #[test]
    fn test_groups_partition_derived_list() {
        let rows = vec![
            Row::from_pairs([("crop", Value::from("maize")), ("n", Value::from(1))]),
            Row::from_pairs([("n", Value::from(2))]),
            Row::from_pairs([("crop", Value::from("rice")), ("n", Value::from(3))]),
            Row::from_pairs([("crop", Value::from("maize")), ("n", Value::from(4))]),
            Row::from_pairs([("crop", Value::Null), ("n", Value::from(5))]),
        ];
        let sort = SortSpec::new("n", SortDirection::Desc);
        let derived = derive_order(&rows, &FilterMap::new(), Some(&sort));
        let groups = group_rows(&rows, &derived, "crop");

        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["null", "maize", "rice", "undefined"]);

        let mut members: Vec<usize> = groups.iter().flat_map(|g| g.members.clone()).collect();
        members.sort_unstable();
        assert_eq!(members, (0..derived.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_group_numbers_by_string_form() {
        let rows = vec![
            Row::from_pairs([("term", Value::from(6))]),
            Row::from_pairs([("term", Value::from(6.0))]),
            Row::from_pairs([("term", Value::from("6"))]),
        ];
        let derived = derive_order(&rows, &FilterMap::new(), None);
        let groups = group_rows(&rows, &derived, "term");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 3);
    }

    #[test]
    fn test_negative_zero_groups_with_zero() {
        let rows = vec![
            Row::from_pairs([("balance", Value::from(0.0))]),
            Row::from_pairs([("balance", Value::from(-0.0))]),
        ];
        let derived = derive_order(&rows, &FilterMap::new(), None);
        let groups = group_rows(&rows, &derived, "balance");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "0");
        assert!(!matches_filters(&rows[1], &filters(&[("balance", "-")])));
    }
}
