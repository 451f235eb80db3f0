//! Session store
//!
//! The session lives in a Yew reducer so components re-render on sign-in and
//! token refresh. Every reduction is also mirrored into a thread-local copy,
//! which is what the guard reads: navigations run in spawned futures that
//! outlive the render that started them, and must see the latest session
//! rather than the one captured at spawn time.

use crate::storage::LocalTokenStorage;
use gloo::storage::{LocalStorage, Storage};
use ppm_core::{EmployeeRole, SessionSnapshot, SessionStore};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, warn};
use yew::prelude::*;

/// Key of the persisted role and login flag
pub const SESSION_KEY: &str = "ppm.session";

thread_local! {
    static CURRENT: RefCell<SessionSnapshot> = RefCell::new(SessionSnapshot::default());
    static DISPATCHER: RefCell<Option<Rc<dyn Fn(SessionAction)>>> = RefCell::new(None);
}

/// Persisted part of the session; the token itself is stored separately
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedSession {
    employee_role: Option<EmployeeRole>,
    need_login: bool,
}

/// Session changes
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    SignedIn {
        role: EmployeeRole,
        access_token: String,
    },
    /// A refresh produced a new access token
    TokenRefreshed(String),
    /// The backend rejected the session
    LoginRequired,
    SignedOut,
}

/// Reducer state holding the current session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub snapshot: SessionSnapshot,
    /// localStorage key for the access token
    pub storage_key: String,
}

impl SessionState {
    /// Restore the session persisted by a previous page load
    pub fn restore(storage_key: &str) -> Self {
        let persisted: PersistedSession = LocalStorage::get(SESSION_KEY).unwrap_or_default();
        let access_token = ppm_core::TokenStorage::get(&LocalTokenStorage, storage_key);

        let state = Self {
            snapshot: SessionSnapshot {
                employee_role: persisted.employee_role,
                need_login: persisted.need_login,
                access_token,
            },
            storage_key: storage_key.to_string(),
        };
        publish(&state.snapshot);
        state
    }

    fn persist(&self) {
        let persisted = PersistedSession {
            employee_role: self.snapshot.employee_role.clone(),
            need_login: self.snapshot.need_login,
        };
        if let Err(err) = LocalStorage::set(SESSION_KEY, &persisted) {
            warn!("Failed to persist session: {}", err);
        }

        match self.snapshot.access_token() {
            Some(token) => LocalTokenStorage.set(&self.storage_key, token),
            None => LocalTokenStorage.remove(&self.storage_key),
        }
    }
}

impl Reducible for SessionState {
    type Action = SessionAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let snapshot = match action {
            SessionAction::SignedIn { role, access_token } => {
                debug!("Signed in as {}", role);
                SessionSnapshot::signed_in(role, access_token)
            }
            SessionAction::TokenRefreshed(access_token) => SessionSnapshot {
                access_token: Some(access_token),
                ..self.snapshot.clone()
            },
            SessionAction::LoginRequired => SessionSnapshot {
                need_login: true,
                access_token: None,
                ..self.snapshot.clone()
            },
            SessionAction::SignedOut => SessionSnapshot::default(),
        };

        let next = Self {
            snapshot,
            storage_key: self.storage_key.clone(),
        };
        next.persist();
        publish(&next.snapshot);
        Rc::new(next)
    }
}

/// Replace the thread-local session copy
fn publish(snapshot: &SessionSnapshot) {
    CURRENT.with(|current| *current.borrow_mut() = snapshot.clone());
}

/// Session store reading the latest published session
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserSession;

impl SessionStore for BrowserSession {
    fn snapshot(&self) -> SessionSnapshot {
        CURRENT.with(|current| current.borrow().clone())
    }
}

/// Apply a session change from outside the component tree, e.g. from a
/// token refresher
///
/// Returns `false` when no [`SessionProvider`] is mounted.
pub fn dispatch_session(action: SessionAction) -> bool {
    let dispatcher = DISPATCHER.with(|d| d.borrow().clone());
    match dispatcher {
        Some(dispatch) => {
            dispatch(action);
            true
        }
        None => {
            warn!("No session provider mounted, dropping {:?}", action);
            false
        }
    }
}

/// Session context handle
pub type SessionContext = UseReducerHandle<SessionState>;

/// Session provider props
#[derive(Properties, PartialEq)]
pub struct SessionProviderProps {
    /// localStorage key holding the access token
    #[prop_or(AttrValue::Static("accessToken"))]
    pub storage_key: AttrValue,
    pub children: Children,
}

/// Session provider component
#[function_component(SessionProvider)]
pub fn session_provider(props: &SessionProviderProps) -> Html {
    let storage_key = props.storage_key.clone();
    let session = use_reducer(move || SessionState::restore(&storage_key));

    {
        let dispatcher = session.dispatcher();
        use_effect_with((), move |_| {
            let dispatch: Rc<dyn Fn(SessionAction)> =
                Rc::new(move |action| dispatcher.dispatch(action));
            DISPATCHER.with(|d| *d.borrow_mut() = Some(dispatch));
            || DISPATCHER.with(|d| *d.borrow_mut() = None)
        });
    }

    html! {
        <ContextProvider<SessionContext> context={session}>
            {props.children.clone()}
        </ContextProvider<SessionContext>>
    }
}

/// Hook to use the session context
#[hook]
pub fn use_session() -> Option<SessionContext> {
    use_context::<SessionContext>()
}
