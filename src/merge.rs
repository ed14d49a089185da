use crate::types::{is_blank, Dataset, Row};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Outcome of merging one secondary dataset into the primary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Primary rows that found a secondary row with the same key.
    pub matched: usize,
    /// Primary rows left untouched (blank key or no secondary match).
    pub unmatched: usize,
    /// Individual fields written into primary rows.
    pub fields_filled: usize,
}

/// Index secondary rows by trimmed key. Blank keys never enter the index and
/// the last row seen for a key shadows earlier ones.
fn index_by_key<'a>(rows: &'a [Row], key: &str) -> HashMap<&'a str, &'a Row> {
    let mut by_key = HashMap::new();
    for row in rows {
        let Some(value) = row.get(key) else { continue };
        if is_blank(value) {
            continue;
        }
        by_key.insert(value.trim(), row);
    }
    by_key
}

/// Whether a secondary value may be written into the primary row.
fn should_fill(primary: &Row, field: &str, value: &str) -> bool {
    match primary.get(field) {
        None => true,
        Some(existing) => is_blank(existing) && !is_blank(value),
    }
}

/// Left-join `secondary` onto `primary` by key, filling gaps in place.
///
/// The primary row set is never changed: secondary-only keys are dropped and
/// non-blank primary values are never overwritten.
#[instrument(
    skip(primary, secondary),
    fields(primary_rows = primary.len(), secondary_rows = secondary.len())
)]
pub fn merge_on_key(
    primary: &mut Dataset,
    primary_key: &str,
    secondary: &Dataset,
    secondary_key: &str,
) -> MergeStats {
    let by_key = index_by_key(&secondary.rows, secondary_key);
    debug!(keys = by_key.len(), "Built secondary lookup");

    let mut stats = MergeStats::default();
    let mut new_fields: Vec<String> = Vec::new();

    for row in primary.rows.iter_mut() {
        let matched = row
            .get(primary_key)
            .and_then(|key| by_key.get(key.trim()).copied());
        let Some(extra) = matched else {
            stats.unmatched += 1;
            continue;
        };
        stats.matched += 1;

        for (field, value) in extra.iter() {
            if field == secondary_key || !should_fill(row, field, value) {
                continue;
            }
            if !row.contains(field) && !new_fields.iter().any(|f| f == field) {
                new_fields.push(field.to_string());
            }
            row.insert(field, value);
            stats.fields_filled += 1;
        }
    }

    for field in &new_fields {
        primary.add_field(field);
    }

    info!(
        matched = stats.matched,
        unmatched = stats.unmatched,
        fields_filled = stats.fields_filled,
        "Merged secondary dataset"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs.iter().copied().collect()
    }

    fn dataset(rows: Vec<Row>) -> Dataset {
        let fields = rows
            .first()
            .map(|r| r.fields().map(str::to_string).collect())
            .unwrap_or_default();
        Dataset::new(fields, rows)
    }

    #[test]
    fn test_fills_blank_and_keeps_existing() {
        let mut primary = dataset(vec![row(&[("rid", "abc123"), ("age", ""), ("name", "Jane")])]);
        let secondary = dataset(vec![row(&[("rid", "abc123"), ("age", "34"), ("name", "Other")])]);

        let stats = merge_on_key(&mut primary, "rid", &secondary, "rid");

        let merged = &primary.rows[0];
        assert_eq!(merged.get("rid"), Some("abc123"));
        assert_eq!(merged.get("age"), Some("34"));
        assert_eq!(merged.get("name"), Some("Jane"));
        assert_eq!(stats.matched, 1);
        assert_eq!(stats.fields_filled, 1);
    }

    #[test]
    fn test_adds_missing_fields_even_when_blank() {
        let mut primary = dataset(vec![row(&[("rid", "a"), ("age", "20")])]);
        let secondary = dataset(vec![row(&[("rid", "a"), ("mathax1", "3"), ("mathax2", "")])]);

        merge_on_key(&mut primary, "rid", &secondary, "rid");

        let merged = &primary.rows[0];
        assert_eq!(merged.get("mathax1"), Some("3"));
        assert_eq!(merged.get("mathax2"), Some(""));
        assert_eq!(primary.fields, vec!["rid", "age", "mathax1", "mathax2"]);
    }

    #[test]
    fn test_blank_secondary_value_is_ignored() {
        let mut primary = dataset(vec![row(&[("rid", "a"), ("age", "  ")])]);
        let secondary = dataset(vec![row(&[("rid", "a"), ("age", "")])]);

        let stats = merge_on_key(&mut primary, "rid", &secondary, "rid");
        assert_eq!(primary.rows[0].get("age"), Some("  "));
        assert_eq!(stats.fields_filled, 0);
    }

    #[test]
    fn test_keys_are_trimmed() {
        let mut primary = dataset(vec![row(&[("rid", " abc "), ("age", "")])]);
        let secondary = dataset(vec![row(&[("rid", "abc\t"), ("age", "50")])]);

        merge_on_key(&mut primary, "rid", &secondary, "rid");
        assert_eq!(primary.rows[0].get("age"), Some("50"));
        assert_eq!(primary.rows[0].get("rid"), Some(" abc "));
    }

    #[test]
    fn test_left_join_preserves_primary_rows() {
        let mut primary = dataset(vec![
            row(&[("rid", "a"), ("age", "")]),
            row(&[("rid", "b"), ("age", "")]),
        ]);
        let secondary = dataset(vec![
            row(&[("rid", "a"), ("age", "30")]),
            row(&[("rid", "zzz"), ("age", "99")]),
        ]);

        let stats = merge_on_key(&mut primary, "rid", &secondary, "rid");
        assert_eq!(primary.len(), 2);
        assert_eq!(primary.rows[1].get("age"), Some(""));
        assert_eq!(stats.matched, 1);
        assert_eq!(stats.unmatched, 1);
    }

    #[test]
    fn test_blank_keys_never_join() {
        let mut primary = dataset(vec![
            row(&[("rid", ""), ("age", "")]),
            row(&[("age", "")]),
        ]);
        let secondary = dataset(vec![row(&[("rid", "  "), ("age", "77")])]);

        let stats = merge_on_key(&mut primary, "rid", &secondary, "rid");
        assert_eq!(primary.rows[0].get("age"), Some(""));
        assert_eq!(primary.rows[1].get("age"), Some(""));
        assert_eq!(stats.matched, 0);
        assert_eq!(stats.unmatched, 2);
    }

    #[test]
    fn test_last_duplicate_secondary_key_wins() {
        let mut primary = dataset(vec![row(&[("rid", "a"), ("age", "")])]);
        let secondary = dataset(vec![
            row(&[("rid", "a"), ("age", "first")]),
            row(&[("rid", "a"), ("age", "last")]),
        ]);

        merge_on_key(&mut primary, "rid", &secondary, "rid");
        assert_eq!(primary.rows[0].get("age"), Some("last"));
    }

    #[test]
    fn test_secondary_key_field_is_not_copied() {
        let mut primary = dataset(vec![row(&[("respondent", "a")])]);
        let secondary = dataset(vec![row(&[("rid", "a"), ("score", "9")])]);

        merge_on_key(&mut primary, "respondent", &secondary, "rid");
        assert!(!primary.rows[0].contains("rid"));
        assert_eq!(primary.rows[0].get("score"), Some("9"));
    }

    #[test]
    fn test_later_merge_fills_only_remaining_gaps() {
        let mut primary = dataset(vec![row(&[("rid", "a"), ("age", ""), ("sex", "")])]);
        let anxiety = dataset(vec![row(&[("rid", "a"), ("age", "21")])]);
        let legacy = dataset(vec![row(&[("rid", "a"), ("age", "22"), ("sex", "F")])]);

        merge_on_key(&mut primary, "rid", &anxiety, "rid");
        merge_on_key(&mut primary, "rid", &legacy, "rid");
        assert_eq!(primary.rows[0].get("age"), Some("21"));
        assert_eq!(primary.rows[0].get("sex"), Some("F"));
    }
}
