//! Multi-document YAML codec for edit batches.
//!
//! Each record becomes one block-style document; documents are joined by
//! `---` lines. `dump` is deterministic so an unedited file reads back
//! byte-identical, which is what the session's "no changes" check relies
//! on.

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use thiserror::Error;

/// A record flattened to a string-keyed YAML mapping.
pub type FlatRecord = Mapping;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// The edited text is unreadable. The user should be offered a chance to
/// fix the error.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid YAML: {0}")]
    Syntax(#[source] serde_yaml::Error),
    #[error("each entry must be a mapping; found {found}")]
    NotAMapping { found: &'static str },
}

/// Serialize a batch of flat records as a sequence of YAML documents.
pub fn dump(batch: &[FlatRecord]) -> Result<String, CodecError> {
    let mut out = String::new();
    for (index, document) in batch.iter().enumerate() {
        if index > 0 {
            out.push_str("---\n");
        }
        out.push_str(&serde_yaml::to_string(document)?);
    }
    Ok(out)
}

/// Parse a sequence of YAML documents back into flat records.
///
/// All keys are coerced to strings: they started out as strings, but the
/// editor may have inadvertently changed their type.
pub fn load(text: &str) -> Result<Vec<FlatRecord>, ParseError> {
    let mut records = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = Value::deserialize(document).map_err(ParseError::Syntax)?;
        match value {
            Value::Mapping(mapping) => records.push(coerce_keys(mapping)),
            other => {
                return Err(ParseError::NotAMapping {
                    found: type_name(&other),
                })
            }
        }
    }
    Ok(records)
}

fn coerce_keys(mapping: Mapping) -> FlatRecord {
    mapping
        .into_iter()
        .map(|(key, value)| {
            let key = match key {
                Value::String(s) => s,
                other => scalar_to_string(&other),
            };
            (Value::String(key), value)
        })
        .collect()
}

/// Render a YAML value the way a user would have typed it as a plain
/// string. Collections fall back to their serialized form.
pub(crate) fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .unwrap_or_default()
            .trim_end()
            .to_owned(),
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(entries: &[(&str, Value)]) -> FlatRecord {
        entries
            .iter()
            .map(|(key, value)| (Value::String((*key).to_owned()), value.clone()))
            .collect()
    }

    #[test]
    fn dump_load_round_trip() {
        let batch = vec![
            flat(&[
                ("id", Value::Number(1.into())),
                ("title", Value::String("Song".into())),
                ("length", Value::Number(180.5.into())),
                ("comp", Value::Bool(false)),
            ]),
            flat(&[
                ("id", Value::Number(2.into())),
                ("title", Value::String("Chanson préférée".into())),
            ]),
        ];
        let text = dump(&batch).expect("dump");
        let back = load(&text).expect("load");
        assert_eq!(back, batch);
    }

    #[test]
    fn dump_uses_block_layout_and_keeps_unicode() {
        let batch = vec![flat(&[("title", Value::String("Früh".into()))])];
        let text = dump(&batch).expect("dump");
        assert!(text.contains("title: Früh"));
        assert!(!text.contains('{'));
    }

    #[test]
    fn dump_is_deterministic() {
        let batch = vec![flat(&[
            ("title", Value::String("a".into())),
            ("artist", Value::String("b".into())),
        ])];
        assert_eq!(dump(&batch).expect("dump"), dump(&batch).expect("dump"));
    }

    #[test]
    fn load_rejects_invalid_syntax() {
        let err = load("title: [unclosed").expect_err("should fail");
        assert!(matches!(err, ParseError::Syntax(_)));
        assert!(err.to_string().starts_with("invalid YAML:"));
    }

    #[test]
    fn load_rejects_non_mapping_documents() {
        let err = load("- a\n- b\n").expect_err("should fail");
        match err {
            ParseError::NotAMapping { found } => assert_eq!(found, "sequence"),
            other => panic!("unexpected error: {other}"),
        }

        let err = load("just a string\n").expect_err("should fail");
        assert!(matches!(err, ParseError::NotAMapping { found: "string" }));
    }

    #[test]
    fn load_coerces_keys_to_strings() {
        let records = load("5: title\ntrue: x\n").expect("load");
        assert_eq!(records.len(), 1);
        assert!(records[0].contains_key("5"));
        assert!(records[0].contains_key("true"));
    }

    #[test]
    fn scalar_rendering_matches_user_expectations() {
        assert_eq!(scalar_to_string(&Value::Null), "");
        assert_eq!(scalar_to_string(&Value::Bool(true)), "true");
        assert_eq!(scalar_to_string(&Value::Number(7.into())), "7");
        assert_eq!(scalar_to_string(&Value::String("x".into())), "x");
    }
}
