//! Collaborator traits.
//!
//! The engine never touches UI state or persisted preferences itself. These
//! traits are the seams through which the host application supplies state
//! and applies commands.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::error::HandlerError;
use crate::message::{
    AppEnvironment, AppInfo, AppWindow, Appearance, PreferencePatch, PreferenceValue,
    WindowResizeRequest,
};

/// Supplies the snapshots sent during every handshake.
///
/// Called from the engine's background tasks; implementations must be cheap
/// and must not block on the host's UI thread for long.
pub trait EnvironmentProvider: Send + Sync + 'static {
    /// Application identity.
    fn app_info(&self) -> AppInfo;

    /// Current language and appearance.
    fn environment(&self) -> AppEnvironment;

    /// Current application windows.
    fn windows(&self) -> Vec<AppWindow>;
}

/// Fixed environment, useful for headless hosts and tests.
#[derive(Debug, Clone)]
pub struct StaticEnvironment {
    /// Application identity.
    pub info: AppInfo,
    /// Language and appearance.
    pub environment: AppEnvironment,
    /// Windows.
    pub windows: Vec<AppWindow>,
}

impl EnvironmentProvider for StaticEnvironment {
    fn app_info(&self) -> AppInfo {
        self.info.clone()
    }

    fn environment(&self) -> AppEnvironment {
        self.environment.clone()
    }

    fn windows(&self) -> Vec<AppWindow> {
        self.windows.clone()
    }
}

/// Key/value preference storage.
///
/// # Example
///
/// ```ignore
/// let prefs = MemoryPreferences::default();
/// prefs.apply(&[PreferencePatch::set("theme", "dark"), PreferencePatch::delete("stale")]);
/// assert_eq!(prefs.get("theme"), Some("dark".into()));
/// ```
pub trait PreferenceStore: Send + Sync + 'static {
    /// All stored entries.
    fn entries(&self) -> Vec<(String, PreferenceValue)>;

    /// Read one key.
    fn get(&self, key: &str) -> Option<PreferenceValue>;

    /// Write one key.
    fn set(&self, key: &str, value: PreferenceValue);

    /// Delete one key.
    fn remove(&self, key: &str);

    /// Full snapshot, sorted by key.
    fn snapshot(&self) -> Vec<PreferencePatch> {
        let mut entries = self.entries();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
            .into_iter()
            .map(|(key, value)| PreferencePatch {
                key,
                value: Some(value),
            })
            .collect()
    }

    /// Apply patches in order: set, or delete when the value is absent/null.
    fn apply(&self, patches: &[PreferencePatch]) {
        for patch in patches {
            match &patch.value {
                Some(value) if !value.is_null() => self.set(&patch.key, value.clone()),
                _ => self.remove(&patch.key),
            }
        }
    }
}

/// In-memory preference store.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    entries: RwLock<BTreeMap<String, PreferenceValue>>,
}

impl MemoryPreferences {
    /// Create a store pre-populated with `entries`.
    pub fn with_entries(entries: impl IntoIterator<Item = (String, PreferenceValue)>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn entries(&self) -> Vec<(String, PreferenceValue)> {
        self.entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn get(&self, key: &str) -> Option<PreferenceValue> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: PreferenceValue) {
        self.entries.write().insert(key.to_owned(), value);
    }

    fn remove(&self, key: &str) {
        self.entries.write().remove(key);
    }
}

/// Applies commands received from the companion.
///
/// Every method defaults to a no-op. Calls arrive in receipt order from a
/// single task; a slow handler delays later commands. Errors are logged and
/// never reported back to the companion.
pub trait CommandHandler: Send + Sync + 'static {
    /// Companion asked for preferences (a snapshot has already been sent).
    fn preferences_requested(&self) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Switch the displayed language.
    fn language_change(&self, locale: &str) -> Result<(), HandlerError> {
        let _ = locale;
        Ok(())
    }

    /// Switch light/dark appearance.
    fn appearance_change(&self, appearance: Appearance) -> Result<(), HandlerError> {
        let _ = appearance;
        Ok(())
    }

    /// Move/resize a window.
    fn window_resize(&self, request: &WindowResizeRequest) -> Result<(), HandlerError> {
        let _ = request;
        Ok(())
    }

    /// Bring a window to front.
    fn window_activate(&self, window_number: i64) -> Result<(), HandlerError> {
        let _ = window_number;
        Ok(())
    }

    /// Preferences were patched (already applied to the store).
    fn preferences_patched(&self, patches: &[PreferencePatch]) -> Result<(), HandlerError> {
        let _ = patches;
        Ok(())
    }
}

/// Handler that ignores every command.
impl CommandHandler for () {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_preferences_apply() {
        let prefs = MemoryPreferences::with_entries([
            ("keep".to_owned(), PreferenceValue::Int(1)),
            ("drop".to_owned(), PreferenceValue::Bool(true)),
            ("null".to_owned(), PreferenceValue::Bool(true)),
        ]);

        prefs.apply(&[
            PreferencePatch::set("new", "value"),
            PreferencePatch::delete("drop"),
            PreferencePatch {
                key: "null".into(),
                value: Some(PreferenceValue::Null),
            },
        ]);

        assert_eq!(prefs.len(), 2);
        assert_eq!(prefs.get("keep"), Some(PreferenceValue::Int(1)));
        assert_eq!(prefs.get("new"), Some("value".into()));
        assert_eq!(prefs.get("drop"), None);
        assert_eq!(prefs.get("null"), None);
    }

    #[test]
    fn test_snapshot_is_full_and_sorted() {
        let prefs = MemoryPreferences::default();
        prefs.set("b", PreferenceValue::Int(2));
        prefs.set("a", PreferenceValue::Int(1));

        let snapshot = prefs.snapshot();
        let keys: Vec<_> = snapshot.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, ["a", "b"]);
        assert!(snapshot.iter().all(|p| !p.is_delete()));
    }

    #[test]
    fn test_patch_order_matters() {
        let prefs = MemoryPreferences::default();
        prefs.apply(&[PreferencePatch::delete("k"), PreferencePatch::set("k", 5i64)]);
        assert_eq!(prefs.get("k"), Some(PreferenceValue::Int(5)));

        prefs.apply(&[PreferencePatch::set("k", 6i64), PreferencePatch::delete("k")]);
        assert!(prefs.is_empty());
    }

    #[test]
    fn test_unit_handler_is_noop() {
        let handler = ();
        assert!(handler.language_change("de").is_ok());
        assert!(handler.window_activate(3).is_ok());
    }
}
