//! PPM client routing core
//!
//! Route table resolution, access token inspection and the navigation guard
//! that decides whether a page transition is allowed, redirected, or allowed
//! after refreshing an expired access token.

pub mod clock;
pub mod config;
pub mod error;
pub mod guard;
pub mod refresh;
pub mod router;
pub mod routes;
pub mod session;
pub mod token;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AppConfig, GuardConfig, RefreshFailurePolicy, RouterConfig};
pub use error::{
    CoreError, ParamError, PatternError, RefreshError, Result, RouterError, TokenError,
};
pub use guard::{NavigationDecision, NavigationGuard, NavigationRequest, RedirectReason};
pub use refresh::{FnRefresher, TokenRefresher};
pub use router::{Hop, HopCause, Navigation, NavigationTarget, Router};
pub use routes::{MatchedRoute, Route, RouteDef, RouteMatch, RouteTable, View, ppm_route_table};
pub use session::{EmployeeRole, MemoryTokenStorage, SessionSnapshot, SessionStore, TokenStorage};
pub use token::{TokenClaims, TokenStatus, decode_claims, inspect_token, is_token_expired};
