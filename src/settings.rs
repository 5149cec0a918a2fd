//! Key-value settings and the access token kept in sync with them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// Settings key holding the optional API access token.
pub const ACCESS_TOKEN_KEY: &str = "access-token";

pub type ChangeHandler = Box<dyn Fn(Option<&str>) + Send + Sync>;

/// Persistent settings owned by the host, observed for external changes.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<String>;

    /// Registers `handler` to receive every new value of `key`.
    fn on_change(&self, key: &str, handler: ChangeHandler);
}

#[derive(Default)]
struct Inner {
    values: HashMap<String, String>,
    handlers: HashMap<String, Vec<Arc<ChangeHandler>>>,
}

/// In-process [`SettingsStore`]; `set` and `remove` notify subscribers.
#[derive(Clone, Default)]
pub struct MemorySettings {
    inner: Arc<Mutex<Inner>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: impl Into<String>) -> Self {
        let settings = Self::new();
        settings.lock().values.insert(key.to_string(), value.into());
        settings
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set(&self, key: &str, value: impl Into<String>) {
        let value = value.into();
        self.lock().values.insert(key.to_string(), value.clone());
        self.notify(key, Some(&value));
    }

    pub fn remove(&self, key: &str) {
        self.lock().values.remove(key);
        self.notify(key, None);
    }

    fn notify(&self, key: &str, value: Option<&str>) {
        // Handlers run outside the lock so they may read the store.
        let handlers = self.lock().handlers.get(key).cloned().unwrap_or_default();
        for handler in handlers {
            handler(value);
        }
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().values.get(key).cloned()
    }

    fn on_change(&self, key: &str, handler: ChangeHandler) {
        self.lock()
            .handlers
            .entry(key.to_string())
            .or_default()
            .push(Arc::new(handler));
    }
}

/// Last access token delivered by the settings store.
#[derive(Debug, Clone, Default)]
pub struct TokenCache {
    token: Arc<RwLock<Option<String>>>,
}

impl TokenCache {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: Arc::new(RwLock::new(token.filter(|t| !t.is_empty()))),
        }
    }

    /// Reads the token once and follows later changes pushed by `store`.
    pub fn subscribe<S: SettingsStore + ?Sized>(store: &S) -> Self {
        let cache = Self::new(store.get(ACCESS_TOKEN_KEY));
        let follower = cache.clone();
        store.on_change(
            ACCESS_TOKEN_KEY,
            Box::new(move |value: Option<&str>| {
                tracing::debug!(present = value.is_some(), "access token changed");
                follower.replace(value.map(str::to_string));
            }),
        );
        cache
    }

    pub fn replace(&self, token: Option<String>) {
        let mut slot = self.token.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = token.filter(|t| !t.is_empty());
    }

    pub fn get(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_follows_store_changes() {
        let store = MemorySettings::with_value(ACCESS_TOKEN_KEY, "first");
        let cache = TokenCache::subscribe(&store);
        assert_eq!(cache.get().as_deref(), Some("first"));

        store.set(ACCESS_TOKEN_KEY, "second");
        assert_eq!(cache.get().as_deref(), Some("second"));

        store.remove(ACCESS_TOKEN_KEY);
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn other_keys_do_not_touch_the_token() {
        let store = MemorySettings::new();
        let cache = TokenCache::subscribe(&store);
        store.set("theme", "dark");
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn empty_token_counts_as_absent() {
        let cache = TokenCache::new(Some(String::new()));
        assert_eq!(cache.get(), None);
        cache.replace(Some("t".into()));
        assert_eq!(cache.get().as_deref(), Some("t"));
    }
}
