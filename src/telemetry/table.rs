//! Hierarchical telemetry tables
//!
//! An in-memory rendering of the dashboard's key/value tree. Every node is a
//! cheap-clone handle; subtables are created lazily and share the root's
//! update feed, so a transport bridge can `watch()` once at the root and see
//! every write in the tree. The wire synchronization protocol that ships
//! these updates to remote dashboards is outside this crate.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;

use super::value::Value;

/// Capacity of the tree-wide update feed
const UPDATE_CAPACITY: usize = 256;

/// A single write to the tree, as seen by watchers
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    /// Path of the table that was written (e.g. "/CameraPublisher/Front")
    pub path: String,
    /// Key under that table
    pub key: String,
    /// New value
    pub value: Value,
}

struct TableInner {
    path: String,
    entries: RwLock<HashMap<String, Value>>,
    children: RwLock<HashMap<String, Table>>,
    updates: broadcast::Sender<Update>,
}

/// Cheap-clone handle to one node of the telemetry tree
#[derive(Clone)]
pub struct Table {
    inner: Arc<TableInner>,
}

impl Table {
    /// Create a root table at the given path
    pub fn root(path: impl Into<String>) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CAPACITY);
        Self::node(path.into(), updates)
    }

    fn node(path: String, updates: broadcast::Sender<Update>) -> Self {
        Self {
            inner: Arc::new(TableInner {
                path,
                entries: RwLock::new(HashMap::new()),
                children: RwLock::new(HashMap::new()),
                updates,
            }),
        }
    }

    /// Full path of this table
    pub fn path(&self) -> &str {
        &self.inner.path
    }

    /// Get or create the child table `name`
    pub fn subtable(&self, name: &str) -> Table {
        {
            let children = self
                .inner
                .children
                .read()
                .unwrap_or_else(|e| e.into_inner());
            if let Some(child) = children.get(name) {
                return child.clone();
            }
        }

        let mut children = self
            .inner
            .children
            .write()
            .unwrap_or_else(|e| e.into_inner());
        children
            .entry(name.to_string())
            .or_insert_with(|| {
                let path = format!("{}/{}", self.inner.path, name);
                Table::node(path, self.inner.updates.clone())
            })
            .clone()
    }

    /// Whether a child table of this name already exists
    pub fn has_subtable(&self, name: &str) -> bool {
        self.inner
            .children
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(name)
    }

    /// Write a value under `key`, notifying watchers
    pub fn put(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();

        self.inner
            .entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.clone());

        // Nobody watching is fine
        let _ = self.inner.updates.send(Update {
            path: self.inner.path.clone(),
            key: key.to_string(),
            value,
        });
    }

    /// Write a boolean under `key`
    pub fn put_bool(&self, key: &str, value: bool) {
        self.put(key, value);
    }

    /// Write a number under `key`
    pub fn put_number(&self, key: &str, value: f64) {
        self.put(key, value);
    }

    /// Write text under `key`
    pub fn put_text(&self, key: &str, value: impl Into<String>) {
        self.put(key, value.into());
    }

    /// Write a text array under `key`
    pub fn put_text_array(&self, key: &str, value: Vec<String>) {
        self.put(key, value);
    }

    /// Read the raw value under `key`
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    /// Read a boolean under `key`
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }

    /// Read a number under `key`
    pub fn get_number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.as_number())
    }

    /// Read text under `key`
    pub fn get_text(&self, key: &str) -> Option<String> {
        match self.get(key) {
            Some(Value::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Read a text array under `key`
    pub fn get_text_array(&self, key: &str) -> Option<Vec<String>> {
        match self.get(key) {
            Some(Value::TextArray(items)) => Some(items),
            _ => None,
        }
    }

    /// Keys present in this table (not including subtables)
    pub fn keys(&self) -> Vec<String> {
        self.inner
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    /// Subscribe to every write in the tree this table belongs to
    pub fn watch(&self) -> broadcast::Receiver<Update> {
        self.inner.updates.subscribe()
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("path", &self.inner.path)
            .field("keys", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_roundtrip() {
        let table = Table::root("/CameraPublisher");
        table.put_text("source", "usb:0");
        table.put_bool("connected", true);
        table.put_number("fps", 30.0);

        assert_eq!(table.get_text("source").as_deref(), Some("usb:0"));
        assert_eq!(table.get_bool("connected"), Some(true));
        assert_eq!(table.get_number("fps"), Some(30.0));
        assert_eq!(table.get_text("missing"), None);
    }

    #[test]
    fn test_subtable_paths() {
        let root = Table::root("/CameraPublisher");
        let cam = root.subtable("Front Camera");

        assert_eq!(cam.path(), "/CameraPublisher/Front Camera");
        assert!(root.has_subtable("Front Camera"));

        // Same handle comes back for the same name
        let again = root.subtable("Front Camera");
        again.put_text("source", "usb:0");
        assert_eq!(cam.get_text("source").as_deref(), Some("usb:0"));
    }

    #[test]
    fn test_watch_sees_subtable_writes() {
        let root = Table::root("/CameraPublisher");
        let mut updates = root.watch();

        root.subtable("cam").put_bool("connected", true);

        let update = updates.try_recv().unwrap();
        assert_eq!(update.path, "/CameraPublisher/cam");
        assert_eq!(update.key, "connected");
        assert_eq!(update.value, Value::Boolean(true));
    }

    #[test]
    fn test_type_mismatch_reads_none() {
        let table = Table::root("/t");
        table.put_number("n", 1.0);
        assert_eq!(table.get_bool("n"), None);
        assert_eq!(table.get_text("n"), None);
    }
}
