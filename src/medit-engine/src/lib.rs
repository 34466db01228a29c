pub mod codec;
pub mod editor;
pub mod flatten;
pub mod importer;
pub mod prompt;
pub mod reconcile;
pub mod session;

pub use codec::{dump, load, CodecError, FlatRecord, ParseError};
pub use editor::{CommandEditor, Editor, EditorError};
pub use flatten::{apply, flatten, is_safe, FieldFilter};
pub use importer::{
    edit_candidate, edit_originals, Candidate, EditHook, ImportAction, ImportDispatcher,
    ImportTask, PromptChoice,
};
pub use prompt::{ConfirmChoice, ConsolePrompter, Prompter};
pub use reconcile::{reconcile, ReconcileError, RefField};
pub use session::{EditError, EditSession};
