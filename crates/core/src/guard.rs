//! Navigation guard
//!
//! Runs before every navigation and decides, in order:
//! 1. admin pages require the admin role, otherwise redirect home
//! 2. the sign-in page is always reachable
//! 3. a session that needs login is sent to sign-in
//! 4. an expired access token is refreshed, at most once
//! 5. the persisted access token must exist, otherwise redirect to sign-in

use crate::clock::{Clock, SystemClock};
use crate::config::{GuardConfig, RefreshFailurePolicy};
use crate::refresh::TokenRefresher;
use crate::session::{SessionSnapshot, TokenStorage};
use crate::token::{TokenStatus, inspect_token};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

/// A navigation about to happen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationRequest<'a> {
    pub to: &'a str,
    pub from: &'a str,
}

impl<'a> NavigationRequest<'a> {
    pub fn new(to: &'a str, from: &'a str) -> Self {
        Self { to, from }
    }
}

/// Why the guard redirected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RedirectReason {
    AdminOnly,
    LoginRequired,
    MissingStoredToken,
    RefreshFailed,
}

impl fmt::Display for RedirectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::AdminOnly => "admin only",
            Self::LoginRequired => "login required",
            Self::MissingStoredToken => "missing stored token",
            Self::RefreshFailed => "refresh failed",
        };
        f.write_str(reason)
    }
}

/// Outcome of a guard check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "kebab-case")]
pub enum NavigationDecision {
    Allow,
    /// Allowed after the expired access token was refreshed
    AllowAfterRefresh,
    Redirect {
        to: String,
        reason: RedirectReason,
        /// A token refresh ran before this redirect was decided
        after_refresh: bool,
    },
}

impl NavigationDecision {
    fn redirect(to: &str, reason: RedirectReason, after_refresh: bool) -> Self {
        Self::Redirect {
            to: to.to_string(),
            reason,
            after_refresh,
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow | Self::AllowAfterRefresh)
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Self::Redirect { to, .. } => Some(to),
            _ => None,
        }
    }

    /// Whether a token refresh ran while deciding
    pub fn refreshed(&self) -> bool {
        match self {
            Self::AllowAfterRefresh => true,
            Self::Redirect { after_refresh, .. } => *after_refresh,
            Self::Allow => false,
        }
    }
}

/// Decides whether navigations may proceed
pub struct NavigationGuard {
    config: GuardConfig,
    clock: Box<dyn Clock>,
    storage: Box<dyn TokenStorage>,
    refresher: Box<dyn TokenRefresher>,
}

impl fmt::Debug for NavigationGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationGuard")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl NavigationGuard {
    /// Create a guard using the system clock
    pub fn new(
        config: GuardConfig,
        storage: impl TokenStorage + 'static,
        refresher: impl TokenRefresher + 'static,
    ) -> Self {
        Self {
            config,
            clock: Box::new(SystemClock),
            storage: Box::new(storage),
            refresher: Box::new(refresher),
        }
    }

    /// Replace the clock used for expiry checks
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Check a navigation against the current session
    pub async fn check(
        &self,
        request: &NavigationRequest<'_>,
        session: &SessionSnapshot,
    ) -> NavigationDecision {
        let config = &self.config;

        let is_admin = session
            .employee_role
            .as_ref()
            .is_some_and(|role| role.as_str() == config.admin_role);
        if has_prefix_ignore_case(request.to, &config.admin_prefix) && !is_admin {
            info!(
                "Blocking {} for role {:?}, redirecting to {}",
                request.to, session.employee_role, config.home_path
            );
            return NavigationDecision::redirect(
                &config.home_path,
                RedirectReason::AdminOnly,
                false,
            );
        }

        if request.to == config.sign_in_path {
            debug!("Sign-in page is always reachable");
            return NavigationDecision::Allow;
        }

        if session.need_login {
            info!("Login required, redirecting {} to sign-in", request.to);
            return NavigationDecision::redirect(
                &config.sign_in_path,
                RedirectReason::LoginRequired,
                false,
            );
        }

        let mut refreshed = false;
        if let Some(token) = session.access_token() {
            let status = inspect_token(Some(token), self.clock.as_ref());
            if status.is_expired() {
                if let TokenStatus::Expired { expired_at } = &status {
                    debug!("Access token expired at {}, refreshing", expired_at);
                }
                refreshed = true;
                if let Err(err) = self.refresher.refresh().await {
                    warn!("Access token refresh failed: {}", err);
                    if config.refresh_failure == RefreshFailurePolicy::RedirectToSignIn {
                        return NavigationDecision::redirect(
                            &config.sign_in_path,
                            RedirectReason::RefreshFailed,
                            true,
                        );
                    }
                }
            }
        }

        let stored = self
            .storage
            .get(&config.storage_key)
            .filter(|token| !token.is_empty());
        if stored.is_none() {
            info!(
                "No '{}' in storage, redirecting {} to sign-in",
                config.storage_key, request.to
            );
            return NavigationDecision::redirect(
                &config.sign_in_path,
                RedirectReason::MissingStoredToken,
                refreshed,
            );
        }

        debug!("Navigation from {} to {} allowed", request.from, request.to);
        if refreshed {
            NavigationDecision::AllowAfterRefresh
        } else {
            NavigationDecision::Allow
        }
    }
}

/// ASCII case-insensitive prefix test, consistent with route matching
fn has_prefix_ignore_case(path: &str, prefix: &str) -> bool {
    path.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}
