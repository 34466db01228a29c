use crate::fields::{FieldSpec, FieldType, FieldValue};
use std::collections::BTreeMap;

/// Which per-kind field filter applies when a record is flattened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Item,
    Album,
}

/// An editable entity with typed fields.
///
/// Every variant is backed by a static field descriptor table built at
/// construction; there is no dynamic attribute creation.
pub trait Record {
    fn kind(&self) -> RecordKind;

    /// Field names in descriptor-table order.
    fn keys(&self) -> Vec<&'static str>;

    fn declared_type(&self, key: &str) -> Option<FieldType>;

    fn get(&self, key: &str) -> Option<FieldValue>;

    /// Assign a typed value. Assigning an identical value leaves the dirty
    /// flag untouched. Unknown keys are ignored; callers decide whether
    /// that deserves a warning.
    fn set(&mut self, key: &str, value: FieldValue);

    /// Assign from a raw string through the field's declared-type coercion.
    fn set_parsed(&mut self, key: &str, raw: &str);

    /// Always-string projection of one field (empty for unknown keys).
    fn formatted(&self, key: &str) -> String;

    fn is_dirty(&self) -> bool;

    /// Revert every field to the last-persisted baseline and clear dirty.
    fn reload(&mut self);

    /// Adopt the current values as the persisted baseline and clear dirty.
    fn mark_saved(&mut self);

    /// Numeric identity, present only once the record has been persisted.
    fn id(&self) -> Option<i64>;

    /// Path reference, used while records have no persisted identity.
    fn path(&self) -> String;

    /// Deep copy, for diff display and original-state indexing.
    fn snapshot(&self) -> Box<dyn Record>;
}

/// Shared storage behind every record variant: current values, the
/// last-persisted baseline, and a dirty flag.
#[derive(Debug, Clone)]
pub struct FieldTable {
    spec: &'static [FieldSpec],
    values: BTreeMap<&'static str, FieldValue>,
    baseline: BTreeMap<&'static str, FieldValue>,
    dirty: bool,
}

impl FieldTable {
    pub fn new(spec: &'static [FieldSpec]) -> Self {
        let values: BTreeMap<&'static str, FieldValue> = spec
            .iter()
            .map(|field| (field.name, field.ty.null_value()))
            .collect();
        Self {
            spec,
            baseline: values.clone(),
            values,
            dirty: false,
        }
    }

    fn lookup(&self, key: &str) -> Option<&'static FieldSpec> {
        self.spec.iter().find(|field| field.name == key)
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.spec.iter().map(|field| field.name).collect()
    }

    pub fn declared_type(&self, key: &str) -> Option<FieldType> {
        self.lookup(key).map(|field| field.ty)
    }

    pub fn get(&self, key: &str) -> Option<FieldValue> {
        self.values.get(key).cloned()
    }

    pub fn set(&mut self, key: &str, value: FieldValue) {
        let Some(field) = self.lookup(key) else {
            return;
        };
        // A value of the wrong variant is re-coerced through the declared
        // type so storage never disagrees with the descriptor table.
        let value = if value.field_type() == field.ty {
            value
        } else {
            field.ty.parse(&value.formatted())
        };
        if self.values.get(field.name) != Some(&value) {
            self.values.insert(field.name, value);
            self.dirty = true;
        }
    }

    pub fn set_parsed(&mut self, key: &str, raw: &str) {
        let Some(field) = self.lookup(key) else {
            return;
        };
        self.set(key, field.ty.parse(raw));
    }

    pub fn formatted(&self, key: &str) -> String {
        self.values
            .get(key)
            .map(FieldValue::formatted)
            .unwrap_or_default()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn reload(&mut self) {
        self.values = self.baseline.clone();
        self.dirty = false;
    }

    pub fn mark_saved(&mut self) {
        self.baseline = self.values.clone();
        self.dirty = false;
    }
}

macro_rules! delegate_record {
    ($kind:expr) => {
        fn kind(&self) -> RecordKind {
            $kind
        }

        fn keys(&self) -> Vec<&'static str> {
            self.table.keys()
        }

        fn declared_type(&self, key: &str) -> Option<FieldType> {
            self.table.declared_type(key)
        }

        fn get(&self, key: &str) -> Option<FieldValue> {
            self.table.get(key)
        }

        fn set(&mut self, key: &str, value: FieldValue) {
            self.table.set(key, value);
        }

        fn set_parsed(&mut self, key: &str, raw: &str) {
            self.table.set_parsed(key, raw);
        }

        fn formatted(&self, key: &str) -> String {
            self.table.formatted(key)
        }

        fn is_dirty(&self) -> bool {
            self.table.is_dirty()
        }

        fn reload(&mut self) {
            self.table.reload();
        }

        fn mark_saved(&mut self) {
            self.table.mark_saved();
        }

        fn snapshot(&self) -> Box<dyn Record> {
            Box::new(self.clone())
        }
    };
}

pub const ITEM_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "id", ty: FieldType::Int },
    FieldSpec { name: "path", ty: FieldType::Text },
    FieldSpec { name: "title", ty: FieldType::Text },
    FieldSpec { name: "artist", ty: FieldType::Text },
    FieldSpec { name: "album", ty: FieldType::Text },
    FieldSpec { name: "albumartist", ty: FieldType::Text },
    FieldSpec { name: "track", ty: FieldType::Int },
    FieldSpec { name: "disc", ty: FieldType::Int },
    FieldSpec { name: "year", ty: FieldType::Int },
    FieldSpec { name: "genre", ty: FieldType::Text },
    FieldSpec { name: "comp", ty: FieldType::Bool },
    FieldSpec { name: "length", ty: FieldType::Float },
];

pub const ALBUM_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "id", ty: FieldType::Int },
    FieldSpec { name: "album", ty: FieldType::Text },
    FieldSpec { name: "albumartist", ty: FieldType::Text },
    FieldSpec { name: "genre", ty: FieldType::Text },
    FieldSpec { name: "year", ty: FieldType::Int },
    FieldSpec { name: "comp", ty: FieldType::Bool },
];

/// Album-level fields shared with (and propagated to) constituent items.
pub const ALBUM_ITEM_KEYS: &[&str] = &["album", "albumartist", "genre", "year", "comp"];

/// A single track's metadata record.
#[derive(Debug, Clone)]
pub struct Item {
    table: FieldTable,
}

impl Item {
    pub fn new() -> Self {
        Self {
            table: FieldTable::new(ITEM_FIELDS),
        }
    }

    /// Builder-style assignment for construction and tests.
    pub fn with(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.table.set(key, value.into());
        self
    }

    /// Adopt the current values as the persisted baseline.
    pub fn saved(mut self) -> Self {
        self.table.mark_saved();
        self
    }

    pub fn from_values(values: &BTreeMap<String, FieldValue>) -> Self {
        let mut item = Self::new();
        for (key, value) in values {
            item.table.set(key, value.clone());
        }
        item.table.mark_saved();
        item
    }

    pub fn values(&self) -> BTreeMap<String, FieldValue> {
        self.table
            .keys()
            .into_iter()
            .filter_map(|key| self.table.get(key).map(|value| (key.to_owned(), value)))
            .collect()
    }
}

impl Default for Item {
    fn default() -> Self {
        Self::new()
    }
}

impl Record for Item {
    delegate_record!(RecordKind::Item);

    fn id(&self) -> Option<i64> {
        match self.table.get("id") {
            Some(FieldValue::Int(id)) if id > 0 => Some(id),
            _ => None,
        }
    }

    fn path(&self) -> String {
        self.table.formatted("path")
    }
}

/// A persisted album record.
#[derive(Debug, Clone)]
pub struct Album {
    table: FieldTable,
}

impl Album {
    pub fn new() -> Self {
        Self {
            table: FieldTable::new(ALBUM_FIELDS),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.table.set(key, value.into());
        self
    }

    pub fn saved(mut self) -> Self {
        self.table.mark_saved();
        self
    }

    pub fn from_values(values: &BTreeMap<String, FieldValue>) -> Self {
        let mut album = Self::new();
        for (key, value) in values {
            album.table.set(key, value.clone());
        }
        album.table.mark_saved();
        album
    }

    pub fn values(&self) -> BTreeMap<String, FieldValue> {
        self.table
            .keys()
            .into_iter()
            .filter_map(|key| self.table.get(key).map(|value| (key.to_owned(), value)))
            .collect()
    }
}

impl Default for Album {
    fn default() -> Self {
        Self::new()
    }
}

impl Record for Album {
    delegate_record!(RecordKind::Album);

    fn id(&self) -> Option<i64> {
        match self.table.get("id") {
            Some(FieldValue::Int(id)) if id > 0 => Some(id),
            _ => None,
        }
    }

    fn path(&self) -> String {
        String::new()
    }
}

pub const SYNTHETIC_ALBUM_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "path", ty: FieldType::Text },
    FieldSpec { name: "album", ty: FieldType::Text },
    FieldSpec { name: "albumartist", ty: FieldType::Text },
    FieldSpec { name: "genre", ty: FieldType::Text },
    FieldSpec { name: "year", ty: FieldType::Int },
    FieldSpec { name: "comp", ty: FieldType::Bool },
];

/// A virtual album built from a group's first item, for group-level editing
/// when no real album record exists yet. The path is an ordinary editable
/// field here, taken from the group's top-level directory.
#[derive(Debug, Clone)]
pub struct SyntheticAlbum {
    table: FieldTable,
}

impl SyntheticAlbum {
    pub fn from_items(items: &[Item], toppath: &str) -> Self {
        let mut table = FieldTable::new(SYNTHETIC_ALBUM_FIELDS);
        if let Some(first) = items.first() {
            for key in ALBUM_ITEM_KEYS {
                if let Some(value) = first.get(key) {
                    table.set(key, value);
                }
            }
        }
        table.set("path", FieldValue::Text(toppath.to_owned()));
        table.mark_saved();
        Self { table }
    }

    /// Copy the shared album-level fields onto every constituent item.
    pub fn propagate(&self, items: &mut [Item]) {
        for key in ALBUM_ITEM_KEYS {
            if let Some(value) = self.table.get(key) {
                for item in items.iter_mut() {
                    item.set(key, value.clone());
                }
            }
        }
    }
}

impl Record for SyntheticAlbum {
    delegate_record!(RecordKind::Album);

    fn id(&self) -> Option<i64> {
        None
    }

    fn path(&self) -> String {
        self.table.formatted("path")
    }
}
