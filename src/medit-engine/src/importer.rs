//! Hooks exposing the edit session to an external import workflow.
//!
//! Mid-import, records have no persisted identity, so the session runs
//! in path-reference mode; a group that is not a singleton also gets a
//! synthetic album prepended so album-level fields can be edited in one
//! place and propagated afterwards.

use crate::reconcile::RefField;
use crate::session::{EditError, EditSession};
use medit_core::fields::FieldValue;
use medit_core::record::{Item, Record, RecordKind, SyntheticAlbum};

/// Signal back to the import workflow after a successful edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportAction {
    /// Re-derive file tags from the edited metadata.
    Retag,
}

/// One unit of work in the import pipeline: a group of items under a
/// common top path, plus candidate matches supplied by the caller.
#[derive(Debug)]
pub struct ImportTask {
    pub items: Vec<Item>,
    pub toppath: String,
    pub candidates: Vec<Candidate>,
}

impl ImportTask {
    pub fn new(items: Vec<Item>, toppath: impl Into<String>) -> Self {
        Self {
            items,
            toppath: toppath.into(),
            candidates: Vec::new(),
        }
    }

    pub fn with_candidates(mut self, candidates: Vec<Candidate>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn singleton(&self) -> bool {
        self.items.len() == 1
    }
}

/// Externally supplied match metadata that can be forced onto a task's
/// items before editing.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub album: String,
    pub albumartist: String,
    pub year: i64,
    pub genre: String,
    /// Titles by track position.
    pub tracks: Vec<String>,
}

impl Candidate {
    pub fn apply_to(&self, items: &mut [Item]) {
        for (position, item) in items.iter_mut().enumerate() {
            item.set("album", FieldValue::Text(self.album.clone()));
            item.set("albumartist", FieldValue::Text(self.albumartist.clone()));
            item.set("year", FieldValue::Int(self.year));
            item.set("genre", FieldValue::Text(self.genre.clone()));
            if let Some(title) = self.tracks.get(position) {
                item.set("title", FieldValue::Text(title.clone()));
                item.set("track", FieldValue::Int(position as i64 + 1));
            }
        }
    }
}

/// Edit the task's raw items. Non-singleton groups get a synthetic album
/// built from the first item; on acceptance its shared fields are
/// propagated to every item and the caller is told to retag. On
/// failure or no-op every item reverts to its last-persisted state.
pub fn edit_originals(
    session: &mut EditSession,
    task: &mut ImportTask,
) -> Result<Option<ImportAction>, EditError> {
    let item_fields = session.fields_for(RecordKind::Item, &[], false);
    let album_fields = session.fields_for(RecordKind::Album, &[], false);
    let mut album =
        (!task.singleton()).then(|| SyntheticAlbum::from_items(&task.items, &task.toppath));

    let success = {
        let mut objs: Vec<&mut dyn Record> = Vec::with_capacity(task.items.len() + 1);
        if let Some(album) = album.as_mut() {
            objs.push(album);
        }
        for item in task.items.iter_mut() {
            objs.push(item);
        }
        session.edit_objects(&mut objs, &item_fields, &album_fields)?
    };

    if success {
        if let Some(album) = &album {
            album.propagate(&mut task.items);
        }
        Ok(Some(ImportAction::Retag))
    } else {
        for item in task.items.iter_mut() {
            item.reload();
        }
        Ok(None)
    }
}

/// Let the user pick one of the task's candidate matches, force its
/// metadata onto the items, then edit as usual.
pub fn edit_candidate(
    session: &mut EditSession,
    task: &mut ImportTask,
) -> Result<Option<ImportAction>, EditError> {
    if task.candidates.is_empty() {
        return edit_originals(session, task);
    }
    let selection = session.choose_candidate(task.candidates.len())?;
    let candidate = task.candidates[selection - 1].clone();
    candidate.apply_to(&mut task.items);
    edit_originals(session, task)
}

/// Which hook a prompt choice dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditHook {
    EditOriginals,
    EditCandidate,
}

/// An extra choice offered on the import workflow's candidate prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptChoice {
    pub short: char,
    pub label: &'static str,
    pub hook: EditHook,
}

/// Registration surface for the external import workflow. The workflow
/// owns the dispatcher and calls `begin` when an import session starts
/// and `prompt_choices` before each candidate decision; this replaces
/// ambient plugin-registry state with explicit wiring.
#[derive(Default)]
pub struct ImportDispatcher {
    before_choose_candidate: Vec<fn(&ImportTask) -> Vec<PromptChoice>>,
    import_begin: Vec<fn(&mut EditSession)>,
}

impl ImportDispatcher {
    pub fn register_before_choose_candidate(
        &mut self,
        hook: fn(&ImportTask) -> Vec<PromptChoice>,
    ) {
        self.before_choose_candidate.push(hook);
    }

    pub fn register_import_begin(&mut self, hook: fn(&mut EditSession)) {
        self.import_begin.push(hook);
    }

    pub fn begin(&self, session: &mut EditSession) {
        for hook in &self.import_begin {
            hook(session);
        }
    }

    pub fn prompt_choices(&self, task: &ImportTask) -> Vec<PromptChoice> {
        self.before_choose_candidate
            .iter()
            .flat_map(|hook| hook(task))
            .collect()
    }
}

/// Register both session hooks with the workflow's dispatcher.
pub fn register(dispatcher: &mut ImportDispatcher) {
    dispatcher.register_before_choose_candidate(before_choose_candidate);
    dispatcher.register_import_begin(import_begin);
}

fn before_choose_candidate(task: &ImportTask) -> Vec<PromptChoice> {
    let mut choices = vec![PromptChoice {
        short: 'd',
        label: "eDit",
        hook: EditHook::EditOriginals,
    }];
    if !task.candidates.is_empty() {
        choices.push(PromptChoice {
            short: 'c',
            label: "edit Candidates",
            hook: EditHook::EditCandidate,
        });
    }
    choices
}

/// Records have no valid ids mid-import; reconcile by path instead.
fn import_begin(session: &mut EditSession) {
    session.set_reference(RefField::Path);
}

/// Dispatch a chosen hook.
pub fn run_hook(
    hook: EditHook,
    session: &mut EditSession,
    task: &mut ImportTask,
) -> Result<Option<ImportAction>, EditError> {
    match hook {
        EditHook::EditOriginals => edit_originals(session, task),
        EditHook::EditCandidate => edit_candidate(session, task),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> ImportTask {
        let items = vec![
            Item::new()
                .with("path", "/import/01.mp3")
                .with("title", "One")
                .with("album", "A")
                .saved(),
            Item::new()
                .with("path", "/import/02.mp3")
                .with("title", "Two")
                .with("album", "A")
                .saved(),
        ];
        ImportTask::new(items, "/import")
    }

    #[test]
    fn candidate_forces_metadata_onto_items() {
        let mut items = task().items;
        let candidate = Candidate {
            album: "Matched".into(),
            albumartist: "Band".into(),
            year: 1999,
            genre: "Rock".into(),
            tracks: vec!["First".into(), "Second".into()],
        };
        candidate.apply_to(&mut items);

        assert_eq!(items[0].formatted("album"), "Matched");
        assert_eq!(items[0].formatted("title"), "First");
        assert_eq!(items[0].get("track"), Some(FieldValue::Int(1)));
        assert_eq!(items[1].formatted("title"), "Second");
        assert_eq!(items[1].get("year"), Some(FieldValue::Int(1999)));
    }

    #[test]
    fn hooks_register_with_the_dispatcher() {
        let mut dispatcher = ImportDispatcher::default();
        register(&mut dispatcher);

        let plain = task();
        let choices = dispatcher.prompt_choices(&plain);
        assert_eq!(choices.len(), 1);
        assert_eq!(choices[0].short, 'd');

        let with_candidates = task().with_candidates(vec![Candidate {
            album: "M".into(),
            albumartist: "B".into(),
            year: 2000,
            genre: "Pop".into(),
            tracks: vec![],
        }]);
        let choices = dispatcher.prompt_choices(&with_candidates);
        assert_eq!(choices.len(), 2);
        assert_eq!(choices[1].hook, EditHook::EditCandidate);
    }
}
