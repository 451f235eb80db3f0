//! Guarded routing components
//!
//! [`GuardedSwitch`] runs every browser location change through the
//! navigation guard before rendering, and rewrites the address bar when the
//! guard or a redirect record sends the user elsewhere. [`RouterProvider`]
//! shares the router with [`NavLink`]s, which take their active class from
//! the router configuration.

use crate::session::BrowserSession;
use ppm_core::routes::is_active;
use ppm_core::{RouteMatch, Router, View};
use std::rc::Rc;
use tracing::{debug, error};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;
use yew_router::history::{BrowserHistory, History};
use yew_router::hooks::use_location;

const DEFAULT_ACTIVE_CLASS: &str = "active";

/// Router shared through context
#[derive(Debug, Clone)]
pub struct RouterContext(pub Rc<Router<View>>);

impl PartialEq for RouterContext {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Router provider props
#[derive(Properties)]
pub struct RouterProviderProps {
    pub router: Rc<Router<View>>,
    pub children: Children,
}

impl PartialEq for RouterProviderProps {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.router, &other.router) && self.children == other.children
    }
}

/// Makes the router available to [`NavLink`]s outside the switch, e.g. in a nav bar
#[function_component(RouterProvider)]
pub fn router_provider(props: &RouterProviderProps) -> Html {
    html! {
        <ContextProvider<RouterContext> context={RouterContext(props.router.clone())}>
            {props.children.clone()}
        </ContextProvider<RouterContext>>
    }
}

/// Sequence of navigations started by one switch; only the latest may settle
#[derive(Debug, Default)]
pub(crate) struct NavigationTickets {
    latest: u64,
}

impl NavigationTickets {
    pub(crate) fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub(crate) fn is_current(&self, ticket: u64) -> bool {
        self.latest == ticket
    }
}

/// Guarded switch props
#[derive(Properties)]
pub struct GuardedSwitchProps {
    pub router: Rc<Router<View>>,
    /// Renders the matched route, or `None` when no route matches
    pub render: Callback<Option<RouteMatch<View>>, Html>,
    /// Shown until the first navigation settles
    #[prop_or_default]
    pub fallback: Html,
}

impl PartialEq for GuardedSwitchProps {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.router, &other.router)
            && self.render == other.render
            && self.fallback == other.fallback
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Settled {
    route: Option<RouteMatch<View>>,
}

/// Renders the route the guard settles on for the current location
///
/// Must be placed inside a `BrowserRouter`.
#[function_component(GuardedSwitch)]
pub fn guarded_switch(props: &GuardedSwitchProps) -> Html {
    let location = use_location();
    let settled = use_state(|| None::<Settled>);
    // Browser path the rendered route belongs to
    let settled_path = use_mut_ref(|| None::<String>);
    // Application path of the last allowed navigation
    let previous = use_mut_ref(|| "/".to_string());
    let tickets = use_mut_ref(NavigationTickets::default);

    let browser_path = location
        .as_ref()
        .map(|l| format!("{}{}{}", l.path(), l.query_str(), l.hash()));

    {
        let router = props.router.clone();
        let settled = settled.clone();
        use_effect_with(browser_path, move |browser_path| {
            let Some(browser_path) = browser_path.clone() else {
                error!("GuardedSwitch rendered outside of a BrowserRouter");
                return;
            };
            if settled_path.borrow().as_deref() == Some(browser_path.as_str()) {
                return;
            }

            let ticket = tickets.borrow_mut().issue();

            spawn_local(async move {
                let target = router.strip_base(&browser_path);
                let from = previous.borrow().clone();
                let outcome = router.navigate(&target, &from, &BrowserSession).await;

                if !tickets.borrow().is_current(ticket) {
                    debug!("Navigation to {} superseded", target);
                    return;
                }

                match outcome {
                    Ok(navigation) => {
                        let final_path = router.with_base(&navigation.target.full_path());
                        *previous.borrow_mut() = navigation.target.path.clone();
                        *settled_path.borrow_mut() = Some(final_path.clone());
                        if final_path != browser_path {
                            debug!("Rewriting location {} to {}", browser_path, final_path);
                            BrowserHistory::new().replace(final_path);
                        }
                        settled.set(Some(Settled {
                            route: navigation.route,
                        }));
                    }
                    Err(err) => {
                        error!("Navigation to {} failed: {}", target, err);
                        *settled_path.borrow_mut() = Some(browser_path);
                        settled.set(Some(Settled { route: None }));
                    }
                }
            });
        });
    }

    let content = match &*settled {
        Some(Settled { route }) => props.render.emit(route.clone()),
        None => props.fallback.clone(),
    };

    html! {
        <ContextProvider<RouterContext> context={RouterContext(props.router.clone())}>
            {content}
        </ContextProvider<RouterContext>>
    }
}

/// Nav link props
#[derive(Properties, PartialEq)]
pub struct NavLinkProps {
    /// Browser path to navigate to
    pub to: AttrValue,
    #[prop_or_default]
    pub classes: Classes,
    /// Class added while the link's route is active; defaults to the
    /// router's `link_active_class`, or `active` without a router in context
    #[prop_or_default]
    pub active_class: Option<AttrValue>,
    #[prop_or_default]
    pub children: Children,
}

/// Anchor that pushes a path and highlights itself while its route is active
#[function_component(NavLink)]
pub fn nav_link(props: &NavLinkProps) -> Html {
    let location = use_location();
    let context = use_context::<RouterContext>();
    let active = location
        .as_ref()
        .is_some_and(|l| is_active(l.path(), &props.to));

    let onclick = {
        let to = props.to.clone();
        Callback::from(move |event: MouseEvent| {
            event.prevent_default();
            BrowserHistory::new().push(to.to_string());
        })
    };

    let mut classes = props.classes.clone();
    if active {
        classes.push(active_class_for(props.active_class.as_ref(), context.as_ref()).to_string());
    }

    html! {
        <a href={props.to.clone()} class={classes} {onclick}>
            { props.children.clone() }
        </a>
    }
}

fn active_class_for(explicit: Option<&AttrValue>, context: Option<&RouterContext>) -> AttrValue {
    explicit
        .cloned()
        .or_else(|| {
            context.map(|RouterContext(router)| {
                AttrValue::from(router.config().link_active_class.clone())
            })
        })
        .unwrap_or(AttrValue::Static(DEFAULT_ACTIVE_CLASS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppm_core::{AppConfig, FnRefresher, RefreshError};

    fn router_with_active_class(class: &str) -> Rc<Router<View>> {
        let mut config = AppConfig::default();
        config.router.link_active_class = class.to_string();
        let refresher = FnRefresher::new(|| async { Err(RefreshError::NoCredential) });
        Rc::new(crate::ppm_router(&config, refresher).unwrap())
    }

    #[test]
    fn test_only_latest_ticket_is_current() {
        let mut tickets = NavigationTickets::default();
        let first = tickets.issue();
        assert!(tickets.is_current(first));

        let second = tickets.issue();
        assert!(!tickets.is_current(first));
        assert!(tickets.is_current(second));
    }

    #[test]
    fn test_active_class_comes_from_router_config() {
        let context = RouterContext(router_with_active_class("is-current"));
        assert_eq!(active_class_for(None, Some(&context)), "is-current");
    }

    #[test]
    fn test_explicit_active_class_wins() {
        let context = RouterContext(router_with_active_class("is-current"));
        let explicit = AttrValue::from("selected");
        assert_eq!(active_class_for(Some(&explicit), Some(&context)), "selected");
        assert_eq!(active_class_for(None, None), "active");
    }
}
