//! The interactive edit-confirm session.
//!
//! One session: flatten the batch, hand the YAML to the editor, parse it
//! back, reconcile, show the diff, and loop until the user applies,
//! cancels, or gives up on a malformed edit. The temporary file lives
//! exactly as long as the session.

use crate::codec::{dump, load, CodecError, FlatRecord};
use crate::editor::{Editor, EditorError};
use crate::flatten::{flatten, FieldFilter};
use crate::prompt::{ConfirmChoice, Prompter};
use crate::reconcile::{reconcile, ReconcileError, RefField};
use medit_core::config::EditConfig;
use medit_core::record::{Record, RecordKind};
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    #[error("failed to create temporary edit file: {0}")]
    TempFile(#[source] io::Error),
    #[error("failed to read edited file: {0}")]
    ReadBack(#[source] io::Error),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error("prompt failed: {0}")]
    Prompt(#[source] io::Error),
}

pub struct EditSession<'a> {
    config: &'a EditConfig,
    editor: &'a mut dyn Editor,
    prompter: &'a mut dyn Prompter,
    reference: RefField,
}

impl<'a> EditSession<'a> {
    pub fn new(
        config: &'a EditConfig,
        editor: &'a mut dyn Editor,
        prompter: &'a mut dyn Prompter,
        reference: RefField,
    ) -> Self {
        Self {
            config,
            editor,
            prompter,
            reference,
        }
    }

    pub fn reference(&self) -> RefField {
        self.reference
    }

    /// Switch reference modes: `Path` for import sessions where records
    /// have no persisted identity yet, `Id` for standalone batch edits.
    pub fn set_reference(&mut self, reference: RefField) {
        self.reference = reference;
    }

    /// Build the field filter for one record kind: the configured base
    /// list, plus requested extras, plus the reference field (which must
    /// be present in every document). `all` disables filtering.
    pub fn fields_for(&self, kind: RecordKind, extra: &[String], all: bool) -> FieldFilter {
        if all {
            return None;
        }
        let base = match kind {
            RecordKind::Item => self.config.item_fields(),
            RecordKind::Album => self.config.album_fields(),
        };
        let mut fields: BTreeSet<String> = base.into_iter().collect();
        fields.extend(extra.iter().cloned());
        fields.insert(self.reference.name().to_owned());
        Some(fields)
    }

    pub fn choose_candidate(&mut self, count: usize) -> Result<usize, EditError> {
        self.prompter.choose_candidate(count).map_err(EditError::Prompt)
    }

    /// Run one edit session over a batch of records.
    ///
    /// Returns true when the user applied changes; the records then hold
    /// the reconciled values and the caller is responsible for
    /// persistence. On every false return the records are unchanged.
    pub fn edit_objects(
        &mut self,
        objs: &mut [&mut dyn Record],
        item_fields: &FieldFilter,
        album_fields: &FieldFilter,
    ) -> Result<bool, EditError> {
        let old_data: Vec<FlatRecord> = objs
            .iter()
            .map(|record| {
                let filter = match record.kind() {
                    RecordKind::Item => item_fields,
                    RecordKind::Album => album_fields,
                };
                flatten(&**record, filter)
            })
            .collect();
        let old_str = dump(&old_data)?;

        // The tempfile handle owns the file; it is removed on every exit
        // path, including errors, when the handle drops.
        let mut file = tempfile::Builder::new()
            .prefix("medit-")
            .suffix(".yaml")
            .tempfile()
            .map_err(EditError::TempFile)?;
        file.write_all(old_str.as_bytes())
            .map_err(EditError::TempFile)?;
        file.flush().map_err(EditError::TempFile)?;
        let path = file.path().to_path_buf();

        loop {
            self.editor.edit(&path)?;

            let new_str = fs::read_to_string(&path).map_err(EditError::ReadBack)?;
            // Compared against the ORIGINAL pre-edit text, also after an
            // edit-again round.
            if new_str == old_str {
                self.prompter.inform("No changes; aborting.");
                return Ok(false);
            }

            let new_data = match load(&new_str) {
                Ok(data) => data,
                Err(err) => {
                    self.prompter.inform(&format!("Could not read data: {err}"));
                    if self
                        .prompter
                        .retry_after_parse_error()
                        .map_err(EditError::Prompt)?
                    {
                        continue;
                    }
                    return Ok(false);
                }
            };

            // Snapshots serve the diff; the reference index inside
            // reconcile is built before any mutation.
            let snapshots: Vec<Box<dyn Record>> =
                objs.iter().map(|record| record.snapshot()).collect();
            reconcile(
                objs,
                &old_data,
                &new_data,
                &self.config.ignore_fields(),
                self.reference,
            )?;

            let mut changed = false;
            for (record, original) in objs.iter().zip(&snapshots) {
                changed |= self.show_changes(original.as_ref(), &**record);
            }
            if !changed {
                self.prompter.inform("No changes to apply.");
                return Ok(false);
            }

            match self.prompter.confirm_changes().map_err(EditError::Prompt)? {
                ConfirmChoice::Apply => return Ok(true),
                ConfirmChoice::Cancel => {
                    for record in objs.iter_mut() {
                        record.reload();
                    }
                    return Ok(false);
                }
                ConfirmChoice::EditAgain => {
                    for record in objs.iter_mut() {
                        record.reload();
                    }
                    continue;
                }
            }
        }
    }

    fn show_changes(&mut self, original: &dyn Record, edited: &dyn Record) -> bool {
        let mut lines = Vec::new();
        for key in edited.keys() {
            let before = original.formatted(key);
            let after = edited.formatted(key);
            if before != after {
                lines.push(format!("  {key}: {before} -> {after}"));
            }
        }
        if lines.is_empty() {
            return false;
        }

        let label = match edited.id() {
            Some(id) => format!("record {id}"),
            None => edited.path(),
        };
        self.prompter.inform(&format!("{label}:"));
        for line in lines {
            self.prompter.inform(&line);
        }
        true
    }
}
