//! `localStorage` adapter for the persisted access token

use ppm_core::TokenStorage;
use tracing::warn;
use web_sys::Storage;

/// Token storage backed by the browser's `localStorage`
///
/// Values are stored as raw strings, the same way the sign-in page writes
/// `accessToken`, so no JSON encoding is applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTokenStorage;

impl LocalTokenStorage {
    pub fn set(&self, key: &str, value: &str) {
        if let Some(storage) = local_storage()
            && storage.set_item(key, value).is_err()
        {
            warn!("Failed to write '{}' to localStorage", key);
        }
    }

    pub fn remove(&self, key: &str) {
        if let Some(storage) = local_storage() {
            let _ = storage.remove_item(key);
        }
    }
}

impl TokenStorage for LocalTokenStorage {
    fn get(&self, key: &str) -> Option<String> {
        local_storage()?.get_item(key).ok().flatten()
    }
}

/// Get localStorage, if the browser exposes it
fn local_storage() -> Option<Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}
