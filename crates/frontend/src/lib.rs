//! PPM browser adapters
//!
//! Wires the routing core into a Yew application: the access token is read
//! from `localStorage`, the session lives in a Yew reducer, and
//! [`GuardedSwitch`] runs the navigation guard on every location change.
//!
//! ```ignore
//! let router = Rc::new(ppm_router(&AppConfig::default(), refresher)?);
//! html! {
//!     <SessionProvider>
//!         <BrowserRouter>
//!             <GuardedSwitch {router} render={Callback::from(render_page)} />
//!         </BrowserRouter>
//!     </SessionProvider>
//! }
//! ```

pub mod logging;
pub mod router;
pub mod session;
pub mod storage;

pub use logging::init_logging;
pub use router::{GuardedSwitch, NavLink, RouterContext, RouterProvider};
pub use session::{
    BrowserSession, SessionAction, SessionContext, SessionProvider, SessionState,
    dispatch_session, use_session,
};
pub use storage::LocalTokenStorage;

use ppm_core::{AppConfig, NavigationGuard, Router, TokenRefresher, View};

/// Build the PPM router backed by browser storage
///
/// # Errors
///
/// Returns an error if a route pattern fails to compile
pub fn ppm_router(
    config: &AppConfig,
    refresher: impl TokenRefresher + 'static,
) -> ppm_core::Result<Router<View>> {
    let guard = NavigationGuard::new(config.guard.clone(), LocalTokenStorage, refresher);
    Ok(Router::new(
        ppm_core::ppm_route_table()?,
        guard,
        config.router.clone(),
    ))
}
