//! Ordered in-memory record store with JSON file persistence.
//!
//! The store is deliberately thin: the editing protocol only needs
//! query-by-criteria, stable numeric ids, and commit-only-dirty.

use crate::fields::FieldValue;
use crate::record::{Album, Item, Record};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const LIBRARY_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("failed to read library file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write library file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("corrupt library file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("library format version {found} is not supported (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("record has not been persisted yet")]
    MissingId,

    #[error("no stored record with id {id}")]
    UnknownId { id: i64 },
}

#[derive(Debug, Serialize, Deserialize)]
struct LibraryFile {
    version: u32,
    items: Vec<BTreeMap<String, FieldValue>>,
    albums: Vec<BTreeMap<String, FieldValue>>,
}

#[derive(Debug)]
pub struct Library {
    path: PathBuf,
    items: Vec<Item>,
    albums: Vec<Album>,
}

impl Library {
    /// Open the library at `path`; a missing file yields an empty library.
    pub fn open(path: &Path) -> Result<Self, LibraryError> {
        if !path.exists() {
            return Ok(Self {
                path: path.to_path_buf(),
                items: Vec::new(),
                albums: Vec::new(),
            });
        }

        let contents = fs::read_to_string(path).map_err(|source| LibraryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: LibraryFile =
            serde_json::from_str(&contents).map_err(|source| LibraryError::Corrupt {
                path: path.to_path_buf(),
                source,
            })?;
        if file.version != LIBRARY_VERSION {
            return Err(LibraryError::UnsupportedVersion {
                found: file.version,
                expected: LIBRARY_VERSION,
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            items: file.items.iter().map(Item::from_values).collect(),
            albums: file.albums.iter().map(Album::from_values).collect(),
        })
    }

    pub fn save(&self) -> Result<(), LibraryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| LibraryError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let file = LibraryFile {
            version: LIBRARY_VERSION,
            items: self.items.iter().map(Item::values).collect(),
            albums: self.albums.iter().map(Album::values).collect(),
        };
        let contents = serde_json::to_string_pretty(&file).map_err(|source| {
            LibraryError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, contents).map_err(|source| LibraryError::Write {
            path: self.path.clone(),
            source,
        })
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn albums(&self) -> &[Album] {
        &self.albums
    }

    /// Insert an item, assigning the next numeric id.
    pub fn add_item(&mut self, item: Item) -> i64 {
        let id = next_id(self.items.iter().map(|i| i.id()));
        let item = item.with("id", id).saved();
        self.items.push(item);
        id
    }

    pub fn add_album(&mut self, album: Album) -> i64 {
        let id = next_id(self.albums.iter().map(|a| a.id()));
        let album = album.with("id", id).saved();
        self.albums.push(album);
        id
    }

    /// Items matching every criterion, cloned for editing.
    pub fn query_items(&self, criteria: &[String]) -> Vec<Item> {
        self.items
            .iter()
            .filter(|item| matches(*item as &dyn Record, criteria))
            .cloned()
            .collect()
    }

    pub fn query_albums(&self, criteria: &[String]) -> Vec<Album> {
        self.albums
            .iter()
            .filter(|album| matches(*album as &dyn Record, criteria))
            .cloned()
            .collect()
    }

    /// Write edited items back by id. Only dirty records are persisted;
    /// the rest are discarded unchanged.
    pub fn commit_items(&mut self, edited: Vec<Item>) -> Result<usize, LibraryError> {
        let saved = commit(&mut self.items, edited)?;
        if saved > 0 {
            self.save()?;
        }
        Ok(saved)
    }

    pub fn commit_albums(&mut self, edited: Vec<Album>) -> Result<usize, LibraryError> {
        let saved = commit(&mut self.albums, edited)?;
        if saved > 0 {
            self.save()?;
        }
        Ok(saved)
    }
}

fn next_id(ids: impl Iterator<Item = Option<i64>>) -> i64 {
    ids.flatten().max().unwrap_or(0) + 1
}

fn commit<R: Record>(stored: &mut [R], edited: Vec<R>) -> Result<usize, LibraryError> {
    let mut saved = 0;
    for mut record in edited {
        if !record.is_dirty() {
            continue;
        }
        let id = record.id().ok_or(LibraryError::MissingId)?;
        let slot = stored
            .iter_mut()
            .find(|candidate| candidate.id() == Some(id))
            .ok_or(LibraryError::UnknownId { id })?;
        tracing::debug!(id, "saving changes");
        record.mark_saved();
        *slot = record;
        saved += 1;
    }
    Ok(saved)
}

/// Every criterion must match: `field:value` compares one formatted field
/// case-insensitively, a bare term substring-matches any formatted field.
fn matches(record: &dyn Record, criteria: &[String]) -> bool {
    criteria.iter().all(|criterion| {
        match criterion.split_once(':') {
            Some((field, value)) => record.formatted(field).eq_ignore_ascii_case(value),
            None => {
                let needle = criterion.to_lowercase();
                record
                    .keys()
                    .iter()
                    .any(|key| record.formatted(key).to_lowercase().contains(&needle))
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_library(path: &Path) -> Library {
        let mut library = Library {
            path: path.to_path_buf(),
            items: Vec::new(),
            albums: Vec::new(),
        };
        library.add_item(
            Item::new()
                .with("path", "/music/a.mp3")
                .with("title", "Alpha")
                .with("artist", "Some Band")
                .with("album", "First"),
        );
        library.add_item(
            Item::new()
                .with("path", "/music/b.mp3")
                .with("title", "Beta")
                .with("artist", "Other Band")
                .with("album", "Second"),
        );
        library.add_album(Album::new().with("album", "First").with("albumartist", "Some Band"));
        library
    }

    #[test]
    fn add_assigns_sequential_ids() {
        let dir = tempfile::tempdir().expect("tempdir");
        let library = sample_library(&dir.path().join("library.json"));
        assert_eq!(library.items()[0].id(), Some(1));
        assert_eq!(library.items()[1].id(), Some(2));
        assert_eq!(library.albums()[0].id(), Some(1));
    }

    #[test]
    fn query_by_field_and_substring() {
        let dir = tempfile::tempdir().expect("tempdir");
        let library = sample_library(&dir.path().join("library.json"));

        let by_field = library.query_items(&["title:alpha".to_owned()]);
        assert_eq!(by_field.len(), 1);
        assert_eq!(by_field[0].formatted("title"), "Alpha");

        let by_term = library.query_items(&["band".to_owned()]);
        assert_eq!(by_term.len(), 2);

        let conjunction =
            library.query_items(&["band".to_owned(), "album:second".to_owned()]);
        assert_eq!(conjunction.len(), 1);
        assert_eq!(conjunction[0].formatted("title"), "Beta");

        assert_eq!(library.query_items(&[]).len(), 2);
    }

    #[test]
    fn save_and_reopen_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("library.json");
        let library = sample_library(&path);
        library.save().expect("save");

        let reopened = Library::open(&path).expect("open");
        assert_eq!(reopened.items().len(), 2);
        assert_eq!(reopened.items()[0].formatted("title"), "Alpha");
        assert_eq!(reopened.albums().len(), 1);
        assert!(!reopened.items()[0].is_dirty());
    }

    #[test]
    fn commit_persists_only_dirty_records() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("library.json");
        let mut library = sample_library(&path);

        let mut edited = library.query_items(&[]);
        edited[0].set("title", "Renamed".into());
        // edited[1] untouched.

        let saved = library.commit_items(edited).expect("commit");
        assert_eq!(saved, 1);
        assert_eq!(library.items()[0].formatted("title"), "Renamed");
        assert!(!library.items()[0].is_dirty());

        let reopened = Library::open(&path).expect("open");
        assert_eq!(reopened.items()[0].formatted("title"), "Renamed");
    }

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let library = Library::open(&dir.path().join("absent.json")).expect("open");
        assert!(library.items().is_empty());
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("library.json");
        fs::write(&path, r#"{"version": 9, "items": [], "albums": []}"#).expect("write");
        assert!(matches!(
            Library::open(&path),
            Err(LibraryError::UnsupportedVersion { found: 9, .. })
        ));
    }
}
