//! The process environment as a map property source.

use tracing::warn;

use super::source::{PropertySource, ENVIRONMENT_PRIORITY};
use super::store::set_path;
use super::value::{Table, Value};
use crate::event::{Event, EventBus, CONFUSED_ENVIRONMENT_TOPIC};

pub const ENVIRONMENT_SOURCE_NAME: &str = "os.env";

const ENV_SEPARATOR: char = '=';

/// Raw `KEY=VALUE` entries of the current process environment.
pub fn process_environ() -> Vec<String> {
    std::env::vars_os()
        .map(|(key, value)| format!("{}={}", key.to_string_lossy(), value.to_string_lossy()))
        .collect()
}

/// Builds the environment source from raw entries.
///
/// Each entry is split on its first `=`; entries without one, or with an empty key, are
/// not loaded. Keys containing `.` are nested. Any entry with a `=` that contains one of
/// `markers` is announced on [`CONFUSED_ENVIRONMENT_TOPIC`], even when its key is empty;
/// this never affects what is loaded.
pub fn environment_source<S: AsRef<str>>(
    entries: &[S],
    markers: &[&str],
    bus: &EventBus,
) -> PropertySource {
    let mut vars = Table::new();
    for entry in entries {
        let entry = entry.as_ref();
        let Some((key, value)) = entry.split_once(ENV_SEPARATOR) else {
            continue;
        };

        if markers.iter().any(|m| !m.is_empty() && entry.contains(m)) {
            warn!(entry, "confused environment value");
            if let Err(e) = bus.publish(CONFUSED_ENVIRONMENT_TOPIC, &Event::ConfusedValue(entry)) {
                warn!(error = %e, "confused value notification failed");
            }
        }

        if key.is_empty() {
            continue;
        }
        set_path(&mut vars, key, Value::String(value.to_string()));
    }

    PropertySource::map(ENVIRONMENT_SOURCE_NAME, vars).with_priority(ENVIRONMENT_PRIORITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::store::get_path;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_splits_on_first_separator() {
        let bus = EventBus::new();
        let source = environment_source(&["URL=a=b", "EMPTY=", "NOSEP", "=hidden"], &[], &bus);
        let map = source.as_map().unwrap();

        assert_eq!(map["URL"], Value::from("a=b"));
        assert_eq!(map["EMPTY"], Value::from(""));
        assert!(!map.contains_key("NOSEP"));
        assert_eq!(map.len(), 2);
        assert_eq!(source.priority(), ENVIRONMENT_PRIORITY);
        assert_eq!(source.property(), ENVIRONMENT_SOURCE_NAME);
    }

    #[test]
    fn test_dotted_keys_are_nested() {
        let bus = EventBus::new();
        let source = environment_source(&["server.port=9090"], &[], &bus);
        assert_eq!(
            get_path(source.as_map().unwrap(), "server.port"),
            Some(&Value::from("9090"))
        );
    }

    #[test]
    fn test_confused_entries_are_published() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let inner = Arc::clone(&seen);
        bus.subscribe([CONFUSED_ENVIRONMENT_TOPIC], 0, move |_, event| {
            if let Event::ConfusedValue(entry) = event {
                inner.lock().unwrap().push(entry.to_string());
            }
            Ok(())
        })
        .unwrap();

        let source = environment_source(&["A=ok", "B=x::y", "C=%%"], &["::", "%%"], &bus);

        assert_eq!(*seen.lock().unwrap(), ["B=x::y", "C=%%"]);
        // still loaded
        assert_eq!(source.as_map().unwrap()["B"], Value::from("x::y"));
    }

    #[test]
    fn test_confused_entry_with_empty_key_is_published() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let inner = Arc::clone(&seen);
        bus.subscribe([CONFUSED_ENVIRONMENT_TOPIC], 0, move |_, event| {
            if let Event::ConfusedValue(entry) = event {
                inner.lock().unwrap().push(entry.to_string());
            }
            Ok(())
        })
        .unwrap();

        let source = environment_source(&["=::=::\\", "OK=1"], &["::"], &bus);

        assert_eq!(*seen.lock().unwrap(), ["=::=::\\"]);
        let map = source.as_map().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["OK"], Value::from("1"));
    }

    #[test]
    fn test_failing_listener_does_not_affect_source() {
        let bus = EventBus::new();
        bus.subscribe([CONFUSED_ENVIRONMENT_TOPIC], 0, |_, _| Err("nope".into()))
            .unwrap();
        let source = environment_source(&["B=x::y"], &["::"], &bus);
        assert_eq!(source.as_map().unwrap().len(), 1);
    }
}
