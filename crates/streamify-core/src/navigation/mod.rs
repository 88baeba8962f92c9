//! Navigation gating between the signed-in and signed-out sections.
//!
//! This module provides:
//! - `Route`: navigation locations and the section each belongs to
//! - `evaluate`: the pure redirect rule
//! - `NavigationGuard`: applies the rule whenever auth state or location changes

pub mod guard;
pub mod route;

pub use guard::{evaluate, GuardDecision, NavigationGuard, Navigator};
pub use route::{Route, RouteError, Section, Tab};
