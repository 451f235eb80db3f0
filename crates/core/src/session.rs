//! Session state and persisted token storage seams

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

/// Role of the signed-in employee, as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EmployeeRole {
    Admin,
    Employee,
    Other(String),
}

impl EmployeeRole {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "ADMIN",
            Self::Employee => "EMPLOYEE",
            Self::Other(role) => role,
        }
    }
}

impl From<String> for EmployeeRole {
    fn from(role: String) -> Self {
        match role.as_str() {
            "ADMIN" => Self::Admin,
            "EMPLOYEE" => Self::Employee,
            _ => Self::Other(role),
        }
    }
}

impl From<&str> for EmployeeRole {
    fn from(role: &str) -> Self {
        Self::from(role.to_string())
    }
}

impl From<EmployeeRole> for String {
    fn from(role: EmployeeRole) -> Self {
        match role {
            EmployeeRole::Other(role) => role,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for EmployeeRole {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for EmployeeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of the session store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Unset until the employee signs in
    pub employee_role: Option<EmployeeRole>,
    pub need_login: bool,
    pub access_token: Option<String>,
}

impl SessionSnapshot {
    /// A signed-in session with the given role and token
    pub fn signed_in(role: impl Into<EmployeeRole>, access_token: impl Into<String>) -> Self {
        Self {
            employee_role: Some(role.into()),
            need_login: false,
            access_token: Some(access_token.into()),
        }
    }

    /// A session that must sign in before navigating anywhere else
    pub fn login_required() -> Self {
        Self {
            need_login: true,
            ..Self::default()
        }
    }

    /// The access token, ignoring empty strings
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Read-only access to the current session
pub trait SessionStore {
    fn snapshot(&self) -> SessionSnapshot;
}

impl SessionStore for SessionSnapshot {
    fn snapshot(&self) -> SessionSnapshot {
        self.clone()
    }
}

impl<T: SessionStore + ?Sized> SessionStore for Rc<T> {
    fn snapshot(&self) -> SessionSnapshot {
        (**self).snapshot()
    }
}

impl<T: SessionStore + ?Sized> SessionStore for RefCell<T> {
    fn snapshot(&self) -> SessionSnapshot {
        self.borrow().snapshot()
    }
}

/// Synchronous key/value storage that outlives page loads
pub trait TokenStorage {
    fn get(&self, key: &str) -> Option<String>;
}

impl<T: TokenStorage + ?Sized> TokenStorage for Rc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

/// In-process storage, shared through `Rc` between the guard and a refresher
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    items: RefCell<HashMap<String, String>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(key: impl Into<String>, value: impl Into<String>) -> Self {
        let storage = Self::new();
        storage.set(key, value);
        storage
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.items.borrow_mut().insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.items.borrow_mut().remove(key)
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing_is_case_sensitive() {
        assert_eq!(EmployeeRole::from("ADMIN"), EmployeeRole::Admin);
        assert_eq!(EmployeeRole::from("EMPLOYEE"), EmployeeRole::Employee);
        assert_eq!(
            EmployeeRole::from("admin"),
            EmployeeRole::Other("admin".to_string())
        );
    }

    #[test]
    fn test_role_serializes_as_plain_string() {
        let snapshot = SessionSnapshot::signed_in("ADMIN", "token");
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["employeeRole"], "ADMIN");
        assert_eq!(json["needLogin"], false);

        let back: SessionSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_empty_access_token_is_absent() {
        let snapshot = SessionSnapshot {
            access_token: Some(String::new()),
            ..SessionSnapshot::default()
        };
        assert_eq!(snapshot.access_token(), None);
    }

    #[test]
    fn test_memory_storage_is_shared_through_rc() {
        let storage = Rc::new(MemoryTokenStorage::new());
        let reader: Rc<dyn TokenStorage> = storage.clone();
        assert_eq!(reader.get("accessToken"), None);

        storage.set("accessToken", "abc");
        assert_eq!(reader.get("accessToken"), Some("abc".to_string()));

        assert_eq!(storage.remove("accessToken"), Some("abc".to_string()));
        assert_eq!(reader.get("accessToken"), None);
    }
}
