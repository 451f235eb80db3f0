//! Browser storage and session store tests
//!
//! Run with `wasm-pack test --headless --firefox crates/frontend`.

use ppm_core::{EmployeeRole, SessionStore, TokenStorage};
use ppm_frontend::{BrowserSession, LocalTokenStorage, SessionAction, SessionState};
use std::rc::Rc;
use wasm_bindgen_test::*;
use yew::Reducible;

wasm_bindgen_test_configure!(run_in_browser);

const KEY: &str = "ppm.test.accessToken";

#[wasm_bindgen_test]
fn test_local_storage_round_trip() {
    let storage = LocalTokenStorage;
    storage.remove(KEY);
    assert_eq!(storage.get(KEY), None);

    storage.set(KEY, "raw.token.value");
    assert_eq!(storage.get(KEY), Some("raw.token.value".to_string()));

    storage.remove(KEY);
    assert_eq!(storage.get(KEY), None);
}

#[wasm_bindgen_test]
fn test_sign_in_persists_token_and_publishes_session() {
    LocalTokenStorage.remove(KEY);
    let state = Rc::new(SessionState::restore(KEY));

    let state = state.reduce(SessionAction::SignedIn {
        role: EmployeeRole::Admin,
        access_token: "issued".to_string(),
    });

    assert_eq!(LocalTokenStorage.get(KEY), Some("issued".to_string()));
    let current = BrowserSession.snapshot();
    assert_eq!(current.employee_role, Some(EmployeeRole::Admin));
    assert_eq!(current.access_token(), Some("issued"));

    let restored = SessionState::restore(KEY);
    assert_eq!(restored.snapshot, state.snapshot);
}

#[wasm_bindgen_test]
fn test_refresh_keeps_role_and_sign_out_clears_token() {
    LocalTokenStorage.remove(KEY);
    let state = Rc::new(SessionState::restore(KEY)).reduce(SessionAction::SignedIn {
        role: EmployeeRole::Employee,
        access_token: "first".to_string(),
    });

    let state = state.reduce(SessionAction::TokenRefreshed("second".to_string()));
    assert_eq!(state.snapshot.employee_role, Some(EmployeeRole::Employee));
    assert_eq!(LocalTokenStorage.get(KEY), Some("second".to_string()));

    let state = state.reduce(SessionAction::SignedOut);
    assert_eq!(state.snapshot.employee_role, None);
    assert_eq!(LocalTokenStorage.get(KEY), None);
    assert_eq!(BrowserSession.snapshot().access_token(), None);
}

#[wasm_bindgen_test]
fn test_login_required_drops_token() {
    LocalTokenStorage.remove(KEY);
    let state = Rc::new(SessionState::restore(KEY))
        .reduce(SessionAction::SignedIn {
            role: EmployeeRole::Employee,
            access_token: "token".to_string(),
        })
        .reduce(SessionAction::LoginRequired);

    assert!(state.snapshot.need_login);
    assert_eq!(LocalTokenStorage.get(KEY), None);
    assert!(BrowserSession.snapshot().need_login);
}
