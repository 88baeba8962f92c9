use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::auth::AuthState;

use super::{Route, Section};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Auth state is still loading; no decision yet
    Wait,
    Stay,
    Redirect(Route),
}

/// Decide whether `route` is consistent with `state`.
///
/// Rules, first match wins:
/// 1. loading: wait
/// 2. signed out in the tab set: go to login
/// 3. signed in on login/register: go home
/// 4. otherwise stay (open routes such as movie details always stay)
pub fn evaluate(state: &AuthState, route: &Route) -> GuardDecision {
    if state.is_loading {
        return GuardDecision::Wait;
    }
    match (state.is_authenticated(), route.section()) {
        (false, Section::Authenticated) => GuardDecision::Redirect(Route::Login),
        (true, Section::Unauthenticated) => GuardDecision::Redirect(Route::HOME),
        _ => GuardDecision::Stay,
    }
}

/// Shared handle on the current location.
/// Clone is cheap; all clones see and move the same location.
#[derive(Clone)]
pub struct Navigator {
    location: Arc<watch::Sender<Route>>,
}

impl Navigator {
    pub fn new(initial: Route) -> Self {
        let (location, _) = watch::channel(initial);
        Self {
            location: Arc::new(location),
        }
    }

    pub fn current(&self) -> Route {
        self.location.borrow().clone()
    }

    pub fn navigate(&self, route: Route) {
        debug!(to = %route, "Navigating");
        self.location.send_replace(route);
    }

    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.location.subscribe()
    }
}

/// Keeps the location consistent with the auth state.
pub struct NavigationGuard {
    auth: watch::Receiver<AuthState>,
    location: watch::Receiver<Route>,
    navigator: Navigator,
}

impl NavigationGuard {
    pub fn new(auth: watch::Receiver<AuthState>, navigator: Navigator) -> Self {
        let location = navigator.subscribe();
        Self {
            auth,
            location,
            navigator,
        }
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Evaluate the current inputs once and apply any redirect.
    pub fn reconcile(&mut self) -> GuardDecision {
        let state = self.auth.borrow_and_update().clone();
        let current = self.location.borrow_and_update().clone();

        let decision = evaluate(&state, &current);
        if let GuardDecision::Redirect(target) = &decision {
            info!(from = %current, to = %target, "Redirecting");
            self.navigator.navigate(target.clone());
        }
        decision
    }

    /// Reconcile on every change to auth state or location.
    /// Returns once the auth state channel closes.
    pub async fn run(mut self) {
        loop {
            self.reconcile();
            tokio::select! {
                changed = self.auth.changed() => {
                    if changed.is_err() {
                        debug!("Auth state closed, navigation guard stopping");
                        break;
                    }
                }
                changed = self.location.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
    }
}
