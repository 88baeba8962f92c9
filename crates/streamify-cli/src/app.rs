//! Application wiring for the Streamify CLI.
//!
//! This module contains the `App` struct that constructs the session manager
//! and navigation guard from configuration, and the command handlers that
//! drive them.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::{debug, info, warn};

use streamify_core::api::TmdbClient;
use streamify_core::config::Config;
use streamify_core::navigation::{GuardDecision, NavigationGuard, Navigator, Route};
use streamify_core::store::SessionStore;
use streamify_core::theme::ThemeMode;
use streamify_core::SessionManager;

/// Environment variable for a non-interactive username
const USERNAME_ENV: &str = "STREAMIFY_USERNAME";

/// Environment variable for a non-interactive password
const PASSWORD_ENV: &str = "STREAMIFY_PASSWORD";

pub struct App {
    pub config: Config,
    pub manager: Arc<SessionManager>,
    pub navigator: Navigator,
    guard: NavigationGuard,
}

impl App {
    /// Build the manager from config and rehydrate the stored session
    pub async fn new() -> Result<Self> {
        let config = load_config();

        let client = TmdbClient::new(config.base_url(), Config::api_key()?)?;
        let store = SessionStore::new(config.storage_backend()?);
        let manager = Arc::new(SessionManager::new(Arc::new(client), store));

        let navigator = Navigator::new(Route::HOME);
        let guard = NavigationGuard::new(manager.subscribe(), navigator.clone());

        manager.initialize().await;
        debug!(authenticated = manager.is_authenticated(), "Session manager initialized");

        let mut app = Self {
            config,
            manager,
            navigator,
            guard,
        };
        app.guard.reconcile();
        Ok(app)
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub async fn login(&mut self, username: Option<String>) -> Result<()> {
        let username = match username
            .or_else(|| std::env::var(USERNAME_ENV).ok())
            .or_else(|| self.config.last_username.clone())
        {
            Some(u) if !u.trim().is_empty() => u.trim().to_string(),
            _ => prompt_username()?,
        };

        let password = match std::env::var(PASSWORD_ENV) {
            Ok(p) if !p.is_empty() => p,
            _ => rpassword::prompt_password(format!("Password for {}: ", username))?,
        };

        if username.is_empty() || password.is_empty() {
            return Err(anyhow!("Username and password required"));
        }

        eprintln!("Authenticating...");
        match self.manager.login(&username, &password).await {
            Ok(session) => {
                self.config.last_username = Some(username);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
                self.guard.reconcile();
                println!(
                    "Login successful! Signed in as {} (@{})",
                    session.profile.display_label(),
                    session.profile.username
                );
                Ok(())
            }
            Err(e) => {
                info!(error = %e, "Login failed");
                Err(anyhow!(e.user_message()))
            }
        }
    }

    pub async fn logout(&mut self) -> Result<()> {
        if !self.manager.is_authenticated() {
            println!("Not signed in");
            return Ok(());
        }
        self.manager.logout().await;
        self.guard.reconcile();
        println!("Logged out");
        Ok(())
    }

    pub async fn status(&self, verify: bool) -> Result<()> {
        if verify && self.manager.is_authenticated() {
            match self.manager.verify_session().await {
                Ok(true) => debug!("Session verified with provider"),
                Ok(false) => println!("Stored session has expired; signed out"),
                Err(e) => warn!(error = %e, "Could not verify session"),
            }
        }

        let state = self.manager.snapshot();
        match state.session {
            Some(session) => {
                println!(
                    "Signed in as {} (@{}), id {}",
                    session.profile.display_label(),
                    session.profile.username,
                    session.profile.id
                );
                println!(
                    "Session established {}",
                    session
                        .established_at
                        .with_timezone(&chrono::Local)
                        .format("%Y-%m-%d %H:%M")
                );
                if let Some(url) = session.profile.avatar_url() {
                    println!("Avatar: {}", url);
                }
            }
            None => println!("Not signed in"),
        }

        let theme = self.manager.store().theme_mode().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read theme preference");
            None
        });
        println!("Theme: {}", theme.unwrap_or_default());
        println!("Location: {}", self.navigator.current());
        Ok(())
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn open(&mut self, path: &str) -> Result<()> {
        let route: Route = path.parse()?;
        self.navigator.navigate(route.clone());
        match self.guard.reconcile() {
            GuardDecision::Redirect(target) => {
                println!("{} is not available, redirected to {}", route, target)
            }
            GuardDecision::Stay | GuardDecision::Wait => println!("Opened {}", route),
        }
        Ok(())
    }
}

/// Show or change the theme preference. Needs only the store.
pub fn theme(mode: Option<&str>) -> Result<()> {
    let config = load_config();
    let store = SessionStore::new(config.storage_backend()?);

    match mode {
        Some(raw) => {
            let mode: ThemeMode = raw.parse()?;
            store.set_theme_mode(mode)?;
            println!("Theme set to {}", mode);
        }
        None => {
            let mode = store.theme_mode()?.unwrap_or_default();
            println!("Theme: {} ({} appearance)", mode, mode.resolve(None));
        }
    }
    Ok(())
}

fn load_config() -> Config {
    match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    }
}

fn prompt_username() -> Result<String> {
    print!("Username: ");
    io::stdout().flush()?;

    let mut username = String::new();
    io::stdin().read_line(&mut username)?;
    Ok(username.trim().to_string())
}
