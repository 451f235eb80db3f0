//! Route patterns, the route table and the PPM page routes

pub mod app;
pub mod pattern;
pub mod table;

pub use app::{View, ppm_route_table, ppm_routes};
pub use pattern::PathPattern;
pub use table::{MatchedRoute, Route, RouteDef, RouteMatch, RouteTable, RouteTarget, is_active};
