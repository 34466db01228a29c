pub mod config;
pub mod fields;
pub mod library;
pub mod logging;
pub mod paths;
pub mod record;

pub use config::{Config, ConfigError, EditConfig, LogLevel, LoggingConfig, ValidationError};
pub use fields::{FieldSpec, FieldType, FieldValue};
pub use library::{Library, LibraryError};
pub use logging::{init_logging, LoggingError, LoggingGuard};
pub use paths::{AppDirs, DirsError};
pub use record::{Album, Item, Record, RecordKind, SyntheticAlbum};

pub const APP_NAME: &str = "medit";
pub const APP_AUTHOR: &str = "Medit";
pub const APP_QUALIFIER: &str = "io";
