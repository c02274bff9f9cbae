//! Path-addressable configuration tree.

use super::value::{Table, Value};

/// Separator between segments of a configuration path.
pub const PATH_SEPARATOR: char = '.';

/// The merged configuration tree, addressed by dot-delimited paths.
///
/// `a.b.c` addresses `root[a][b][c]`. A path whose non-final segment resolves to a
/// scalar is unaddressable and reads as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NestedStore {
    root: Table,
}

impl NestedStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing tree as the store root.
    pub fn from_table(root: Table) -> Self {
        Self { root }
    }

    /// The root table.
    pub fn as_table(&self) -> &Table {
        &self.root
    }

    /// Consumes the store, returning the root table.
    pub fn into_table(self) -> Table {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Removes every key.
    pub fn clear(&mut self) {
        self.root.clear();
    }

    /// Looks up `path`. A path ending exactly at an intermediate table yields that table.
    pub fn get(&self, path: &str) -> Option<&Value> {
        get_path(&self.root, path)
    }

    /// Assigns `value` at `path`, replacing any missing or scalar intermediate with an empty table.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) {
        set_path(&mut self.root, path, value.into());
    }

    /// Whether `path` resolves to any value, tables included.
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Deep-merges `overlay` into the store; overlay values win.
    pub fn merge(&mut self, overlay: Table) {
        deep_merge(&mut self.root, overlay);
    }
}

impl From<Table> for NestedStore {
    fn from(root: Table) -> Self {
        Self::from_table(root)
    }
}

pub fn get_path<'a>(table: &'a Table, path: &str) -> Option<&'a Value> {
    let mut segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    let last = segments.pop()?;
    let mut current = table;
    for segment in segments {
        current = current.get(segment)?.as_table()?;
    }
    current.get(last)
}

pub fn set_path(table: &mut Table, path: &str, value: Value) {
    let mut segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    let Some(last) = segments.pop() else {
        return;
    };
    let mut current = table;
    for segment in segments {
        if !matches!(current.get(segment), Some(Value::Table(_))) {
            current.insert(segment.to_string(), Value::Table(Table::new()));
        }
        current = match current.get_mut(segment) {
            Some(Value::Table(nested)) => nested,
            _ => return,
        };
    }
    current.insert(last.to_string(), value);
}

/// Merges `overlay` into `base`. Tables merge recursively; any other collision is a replace.
pub fn deep_merge(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(base_table)), Value::Table(overlay_table)) => {
                deep_merge(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn make_table(toml_str: &str) -> Table {
        crate::config::value::from_toml_table(toml::from_str(toml_str).unwrap())
    }

    #[test]
    fn test_set_then_get_nested() {
        let mut store = NestedStore::new();
        store.set("server.http.port", 8080i64);
        store.set("server.name", "api");

        assert_eq!(store.get("server.http.port"), Some(&Value::Integer(8080)));
        assert_eq!(store.get("server.name"), Some(&Value::from("api")));
    }

    #[test]
    fn test_set_order_independent() {
        let mut a = NestedStore::new();
        a.set("x.y", 1i64);
        a.set("x.z", 2i64);

        let mut b = NestedStore::new();
        b.set("x.z", 2i64);
        b.set("x.y", 1i64);

        assert_eq!(a, b);
    }

    #[test]
    fn test_get_through_scalar_is_absent() {
        let mut store = NestedStore::new();
        store.set("a", 5i64);

        assert_eq!(store.get("a.b"), None);
        assert!(!store.contains("a.b"));
    }

    #[test]
    fn test_get_missing_leaf_is_absent() {
        let store = NestedStore::from_table(make_table("[a]\nb = 1"));
        assert_eq!(store.get("a.c"), None);
        assert_eq!(store.get("z"), None);
    }

    #[test]
    fn test_get_prefix_returns_subtable() {
        let store = NestedStore::from_table(make_table("[a]\nb = 1"));
        let sub = store.get("a").and_then(Value::as_table).unwrap();
        assert_eq!(sub.get("b"), Some(&Value::Integer(1)));
        assert!(store.contains("a"));
    }

    #[test]
    fn test_set_replaces_scalar_intermediate() {
        let mut store = NestedStore::new();
        store.set("a", "scalar");
        store.set("a.b", true);

        assert_eq!(store.get("a.b"), Some(&Value::Boolean(true)));
    }

    #[test]
    fn test_contains_final_scalar() {
        let mut store = NestedStore::new();
        store.set("a.b", 1i64);
        assert!(store.contains("a.b"));
        assert!(!store.contains("a.b.c"));
    }

    #[test]
    fn test_merge_overlay_wins() {
        let mut base = make_table(
            r#"
            name = "base"
            [server]
            host = "localhost"
            port = 8080
            "#,
        );
        let overlay = make_table(
            r#"
            [server]
            port = 9090
            "#,
        );
        deep_merge(&mut base, overlay);

        assert_eq!(base["name"], Value::from("base"));
        assert_eq!(base["server"].as_table().unwrap()["host"], Value::from("localhost"));
        assert_eq!(base["server"].as_table().unwrap()["port"], Value::Integer(9090));
    }

    #[test]
    fn test_merge_type_clash_replaces() {
        let mut base = make_table("[a]\nb = 1");
        deep_merge(&mut base, make_table("a = \"flat\""));
        assert_eq!(base["a"], Value::from("flat"));

        deep_merge(&mut base, make_table("[a]\nc = 2"));
        assert_eq!(base["a"], Value::Table(make_table("c = 2")));
    }

    #[test]
    fn test_merge_arrays_replace() {
        let mut base = make_table("items = [1, 2, 3]");
        deep_merge(&mut base, make_table("items = [4]"));
        assert_eq!(base["items"], Value::from(vec![4i64]));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let target = make_table("a = 1\n[b]\nc = 2\nd = [1]");
        let source = make_table("a = 3\n[b]\nd = [2]\n[e]\nf = true");

        let mut once = target.clone();
        deep_merge(&mut once, source.clone());
        let mut twice = once.clone();
        deep_merge(&mut twice, source);

        assert_eq!(once, twice);
    }
}
