use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Tabs of the signed-in section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Home,
    Search,
    Saved,
    Profile,
}

impl Tab {
    fn slug(&self) -> &'static str {
        match self {
            Tab::Home => "",
            Tab::Search => "search",
            Tab::Saved => "saved",
            Tab::Profile => "profile",
        }
    }
}

/// Which part of the app a route lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Login and registration screens
    Unauthenticated,
    /// The tab set
    Authenticated,
    /// Reachable regardless of auth state (deep links)
    Open,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Tabs(Tab),
    MovieDetail(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RouteError {
    #[error("Unknown route: {0}")]
    Unknown(String),

    #[error("Movie route is missing an id")]
    MissingMovieId,
}

impl Route {
    /// Signed-in landing page
    pub const HOME: Route = Route::Tabs(Tab::Home);

    pub fn section(&self) -> Section {
        match self {
            Route::Login | Route::Register => Section::Unauthenticated,
            Route::Tabs(_) => Section::Authenticated,
            Route::MovieDetail(_) => Section::Open,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::Tabs(tab) => format!("/{}", tab.slug()),
            Route::MovieDetail(id) => format!("/movies/{}", id),
        }
    }
}

impl FromStr for Route {
    type Err = RouteError;

    /// Accepts both plain paths (`/saved`) and group-prefixed ones (`/(tabs)/saved`)
    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = path
            .split('?')
            .next()
            .unwrap_or_default()
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let segments = match segments.split_first() {
            Some((&"(tabs)", rest)) => {
                if rest.is_empty() {
                    return Ok(Route::HOME);
                }
                rest
            }
            _ => &segments[..],
        };

        match segments {
            [] | ["index"] => Ok(Route::HOME),
            ["login"] => Ok(Route::Login),
            ["register"] => Ok(Route::Register),
            ["search"] => Ok(Route::Tabs(Tab::Search)),
            ["saved"] => Ok(Route::Tabs(Tab::Saved)),
            ["profile"] => Ok(Route::Tabs(Tab::Profile)),
            ["movies"] => Err(RouteError::MissingMovieId),
            ["movies", id] => Ok(Route::MovieDetail(id.to_string())),
            _ => Err(RouteError::Unknown(path.to_string())),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
