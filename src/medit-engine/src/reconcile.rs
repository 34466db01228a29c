//! Matching edited documents back to their source records.

use crate::codec::{scalar_to_string, FlatRecord};
use crate::flatten::apply;
use medit_core::record::Record;
use std::collections::HashMap;
use thiserror::Error;

/// The stable, non-editable field used to match an edited document back to
/// its source record. `Id` is valid once records are persisted; `Path`
/// covers records that have no identity yet, e.g. mid-import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefField {
    Id,
    Path,
}

impl RefField {
    pub fn name(&self) -> &'static str {
        match self {
            RefField::Id => "id",
            RefField::Path => "path",
        }
    }

    /// Reference value of an in-memory record, normalized to a string.
    pub fn value_of(&self, record: &dyn Record) -> Option<String> {
        match self {
            RefField::Id => record.id().map(|id| id.to_string()),
            RefField::Path => {
                let path = record.path();
                (!path.is_empty()).then_some(path)
            }
        }
    }

    /// Reference value of a flattened document, normalized the same way.
    pub fn value_from(&self, flat: &FlatRecord) -> Option<String> {
        flat.get(self.name()).map(scalar_to_string)
    }
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The reference field is always present and protected by the
    /// ignore-set; a lookup miss means that protection failed and the
    /// session state can no longer be trusted.
    #[error("edited {field} {value:?} does not match any record in the batch")]
    ReferenceLookup {
        field: &'static str,
        value: Option<String>,
    },
}

/// Pair `old_data` and `new_data` positionally and write accepted edits
/// onto the matching records.
///
/// A length mismatch is a warning, not an error: pairing proceeds on the
/// shorter length and surplus entries are dropped. A record whose
/// ignored fields changed is skipped entirely; the rest of the batch
/// still applies.
pub fn reconcile(
    objs: &mut [&mut dyn Record],
    old_data: &[FlatRecord],
    new_data: &[FlatRecord],
    ignore_fields: &[String],
    reference: RefField,
) -> Result<(), ReconcileError> {
    if old_data.len() != new_data.len() {
        tracing::warn!(
            original = old_data.len(),
            edited = new_data.len(),
            "number of records changed"
        );
    }

    let mut index: HashMap<String, usize> = HashMap::new();
    for (position, record) in objs.iter().enumerate() {
        if let Some(value) = reference.value_of(&**record) {
            index.insert(value, position);
        }
    }

    for (old_doc, new_doc) in old_data.iter().zip(new_data) {
        let tampered = ignore_fields
            .iter()
            .find(|field| old_doc.get(field.as_str()) != new_doc.get(field.as_str()));
        if let Some(field) = tampered {
            tracing::warn!(field = %field, "ignoring record whose protected field changed");
            continue;
        }

        let value = reference.value_from(old_doc);
        let position = value
            .as_ref()
            .and_then(|v| index.get(v))
            .copied()
            .ok_or_else(|| ReconcileError::ReferenceLookup {
                field: reference.name(),
                value: value.clone(),
            })?;
        apply(&mut *objs[position], new_doc);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use medit_core::fields::FieldValue;
    use medit_core::record::Item;
    use serde_yaml::Value;

    fn items() -> Vec<Item> {
        vec![
            Item::new()
                .with("id", 1i64)
                .with("path", "/music/a.mp3")
                .with("title", "Alpha")
                .saved(),
            Item::new()
                .with("id", 2i64)
                .with("path", "/music/b.mp3")
                .with("title", "Beta")
                .saved(),
        ]
    }

    fn ignore() -> Vec<String> {
        vec!["id".to_owned(), "path".to_owned()]
    }

    fn run(
        records: &mut [Item],
        old_data: &[FlatRecord],
        new_data: &[FlatRecord],
        reference: RefField,
    ) -> Result<(), ReconcileError> {
        let mut objs: Vec<&mut dyn Record> = records
            .iter_mut()
            .map(|record| record as &mut dyn Record)
            .collect();
        reconcile(&mut objs, old_data, new_data, &ignore(), reference)
    }

    #[test]
    fn edits_land_on_the_right_record_by_id() {
        let mut records = items();
        let old_data: Vec<FlatRecord> =
            records.iter().map(|r| flatten(r, &None)).collect();
        let mut new_data = old_data.clone();
        new_data[1].insert("title".into(), Value::String("Beta Prime".into()));

        run(&mut records, &old_data, &new_data, RefField::Id).expect("reconcile");
        assert_eq!(records[0].formatted("title"), "Alpha");
        assert_eq!(records[1].formatted("title"), "Beta Prime");
        assert!(!records[0].is_dirty());
        assert!(records[1].is_dirty());
    }

    #[test]
    fn path_mode_matches_unpersisted_records() {
        let mut records = vec![
            Item::new().with("path", "/import/a.mp3").with("title", "A").saved(),
            Item::new().with("path", "/import/b.mp3").with("title", "B").saved(),
        ];
        let old_data: Vec<FlatRecord> =
            records.iter().map(|r| flatten(r, &None)).collect();
        let mut new_data = old_data.clone();
        new_data[0].insert("title".into(), Value::String("A2".into()));

        run(&mut records, &old_data, &new_data, RefField::Path).expect("reconcile");
        assert_eq!(records[0].formatted("title"), "A2");
        assert_eq!(records[1].formatted("title"), "B");
    }

    #[test]
    fn tampered_ignore_field_skips_only_that_record() {
        let mut records = items();
        let old_data: Vec<FlatRecord> =
            records.iter().map(|r| flatten(r, &None)).collect();
        let mut new_data = old_data.clone();
        // First record: id edited from 1 to 6 -> whole record rejected,
        // even though its title also changed.
        new_data[0].insert("id".into(), Value::Number(6.into()));
        new_data[0].insert("title".into(), Value::String("Hijacked".into()));
        // Sibling edit still applies.
        new_data[1].insert("title".into(), Value::String("Beta Prime".into()));

        run(&mut records, &old_data, &new_data, RefField::Id).expect("reconcile");
        assert_eq!(records[0].formatted("title"), "Alpha");
        assert_eq!(records[0].id(), Some(1));
        assert!(!records[0].is_dirty());
        assert_eq!(records[1].formatted("title"), "Beta Prime");
    }

    #[test]
    fn count_mismatch_drops_surplus_entries() {
        let mut records = items();
        let old_data: Vec<FlatRecord> =
            records.iter().map(|r| flatten(r, &None)).collect();
        // The user deleted the second document.
        let mut new_data = old_data.clone();
        new_data.truncate(1);
        new_data[0].insert("title".into(), Value::String("Alpha 2".into()));

        run(&mut records, &old_data, &new_data, RefField::Id).expect("reconcile");
        assert_eq!(records[0].formatted("title"), "Alpha 2");
        assert_eq!(records[1].formatted("title"), "Beta");
    }

    #[test]
    fn reference_lookup_miss_is_a_hard_error() {
        let mut records = items();
        // Old data claims an id that no record in the batch has.
        let mut old_data: Vec<FlatRecord> =
            records.iter().map(|r| flatten(r, &None)).collect();
        old_data[0].insert("id".into(), Value::Number(99.into()));
        let mut new_data = old_data.clone();
        new_data[0].insert("title".into(), Value::String("X".into()));

        let err = run(&mut records, &old_data, &new_data, RefField::Id)
            .expect_err("lookup must fail");
        assert!(matches!(
            err,
            ReconcileError::ReferenceLookup { field: "id", .. }
        ));
        assert_eq!(records[0].get("title"), Some(FieldValue::Text("Alpha".into())));
    }
}
