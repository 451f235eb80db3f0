//! Guard and router configuration
//!
//! Defaults reproduce the PPM client's behavior. Values can be overridden
//! from a TOML file and from `PPM_`-prefixed environment variables, e.g.
//! `PPM_GUARD__SIGN_IN_PATH=/login` or `PPM_ROUTER__MAX_REDIRECTS=4`.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What the guard does when refreshing an expired token fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefreshFailurePolicy {
    /// Ignore the failure and continue to the stored-token check
    #[default]
    Proceed,
    /// Send the user to the sign-in page
    RedirectToSignIn,
}

/// Navigation guard configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Paths starting with this prefix are restricted to `admin_role`
    pub admin_prefix: String,
    pub admin_role: String,
    /// Always reachable, and the target of login redirects
    pub sign_in_path: String,
    /// Where non-admins are sent from admin pages
    pub home_path: String,
    /// Persisted storage key holding the access token
    pub storage_key: String,
    pub refresh_failure: RefreshFailurePolicy,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            admin_prefix: "/admin".to_string(),
            admin_role: "ADMIN".to_string(),
            sign_in_path: "/sign-in".to_string(),
            home_path: "/".to_string(),
            storage_key: "accessToken".to_string(),
            refresh_failure: RefreshFailurePolicy::default(),
        }
    }
}

/// Router driver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Path prefix the application is served under
    pub base: String,
    /// Redirect hops allowed in one navigation
    pub max_redirects: usize,
    /// CSS class for links to the active route
    pub link_active_class: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            base: "/".to_string(),
            max_redirects: 8,
            link_active_class: "active".to_string(),
        }
    }
}

/// Complete client routing configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub guard: GuardConfig,
    pub router: RouterConfig,
}

impl AppConfig {
    /// Load configuration from an optional file plus environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a value has the wrong type
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("PPM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_client_behavior() {
        let config = AppConfig::default();
        assert_eq!(config.guard.admin_prefix, "/admin");
        assert_eq!(config.guard.admin_role, "ADMIN");
        assert_eq!(config.guard.sign_in_path, "/sign-in");
        assert_eq!(config.guard.home_path, "/");
        assert_eq!(config.guard.storage_key, "accessToken");
        assert_eq!(config.guard.refresh_failure, RefreshFailurePolicy::Proceed);
        assert_eq!(config.router.max_redirects, 8);
        assert_eq!(config.router.link_active_class, "active");
    }

    #[test]
    fn test_load_from_toml_file_keeps_unset_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[guard]\nsign_in_path = \"/login\"\nrefresh_failure = \"redirect-to-sign-in\"\n\n[router]\nmax_redirects = 3"
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.guard.sign_in_path, "/login");
        assert_eq!(
            config.guard.refresh_failure,
            RefreshFailurePolicy::RedirectToSignIn
        );
        assert_eq!(config.guard.admin_prefix, "/admin");
        assert_eq!(config.router.max_redirects, 3);
        assert_eq!(config.router.base, "/");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = AppConfig::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AppConfig::default();
        let rendered = config.to_toml_string().unwrap();
        assert!(rendered.contains("[guard]"));
        let parsed: AppConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
