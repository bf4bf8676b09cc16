//! Apix - composition root
//!
//! Wires the file-backed stores, the reqwest transport and the system clock
//! into the application services, rooted at the configured directory.

use std::fmt;
use std::sync::Arc;

use apix_application::ports::{HistoryLog, HttpClient, HttpClientError, ListingWarning};
use apix_application::{
    ApplicationError, AuthProfiles, CredentialResolver, ExecuteRequest, ProfileError, SendRequest,
    Templates,
};
use apix_domain::{AuthProfile, Template};
use apix_infrastructure::{
    ApixConfig, ConfigError, FileHistoryLog, JsonFileStore, ReqwestHttpClient, SystemClock,
};
use thiserror::Error;
use tracing::{info, warn};

/// Template store backed by JSON files.
pub type TemplateStore = JsonFileStore<Template>;

/// Auth profile store backed by JSON files.
pub type ProfileStore = JsonFileStore<AuthProfile>;

/// Request pipeline over the file-backed stores.
pub type Sender<C> = SendRequest<C, FileHistoryLog, TemplateStore, ProfileStore, SystemClock>;

/// Errors raised while starting up.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] HttpClientError),

    /// The auth profile registry could not be opened.
    #[error("failed to open auth profiles: {0}")]
    Profiles(#[from] ProfileError),
}

/// The assembled services.
pub struct Apix<C = ReqwestHttpClient> {
    config: ApixConfig,
    /// Auth profile registry.
    pub profiles: Arc<AuthProfiles<ProfileStore>>,
    /// Template management.
    pub templates: Templates<TemplateStore>,
    /// History log.
    pub history: Arc<FileHistoryLog>,
    /// Request pipeline.
    pub sender: Sender<C>,
}

impl Apix<ReqwestHttpClient> {
    /// Opens the services with the reqwest transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built or the profile
    /// registry cannot be opened.
    pub async fn open(config: ApixConfig) -> Result<Self, StartupError> {
        let client = ReqwestHttpClient::with_options(&config.user_agent, config.max_redirects)?;
        Self::with_client(config, Arc::new(client)).await
    }
}

impl<C: HttpClient> Apix<C> {
    /// Opens the services with the given transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile registry cannot be opened.
    pub async fn with_client(config: ApixConfig, client: Arc<C>) -> Result<Self, StartupError> {
        let root = config.root_dir.as_path();
        let template_store = Arc::new(TemplateStore::new(root));
        let profile_store = Arc::new(ProfileStore::new(root));
        let history = Arc::new(FileHistoryLog::new(root));

        let profiles = Arc::new(AuthProfiles::open(profile_store).await?);
        let executor = ExecuteRequest::new(
            client,
            Arc::clone(&history),
            Arc::clone(&template_store),
            config.execute_options(),
        );
        let resolver = CredentialResolver::new(Arc::clone(&profiles), Arc::new(SystemClock::new()));
        let sender = SendRequest::new(executor, resolver, config.base_url().map(str::to_string));

        info!(root = %root.display(), "apix store opened");
        Ok(Self {
            templates: Templates::new(template_store),
            profiles,
            history,
            sender,
            config,
        })
    }

    /// Configuration the services were opened with.
    #[must_use]
    pub const fn config(&self) -> &ApixConfig {
        &self.config
    }

    /// Summarizes the store contents.
    ///
    /// # Errors
    ///
    /// Returns an error if a store cannot be enumerated.
    pub async fn status(&self) -> Result<Status, ApplicationError> {
        let templates = self.templates.list().await?;
        let profiles = self.profiles.list().await?;
        let history_entries = self.history.entries().await?.len();

        let mut skipped = templates.warnings;
        skipped.extend(profiles.warnings);
        for warning in &skipped {
            warn!(key = %warning.key, reason = %warning.reason, "unreadable record");
        }

        Ok(Status {
            templates: templates.records.into_iter().map(|t| t.name).collect(),
            profiles: profiles.records,
            active_profile: self.profiles.active_name().await,
            history_entries,
            skipped,
        })
    }
}

/// Store contents at a point in time.
#[derive(Debug, Clone)]
pub struct Status {
    /// Template names in key order.
    pub templates: Vec<String>,
    /// Auth profiles in key order.
    pub profiles: Vec<AuthProfile>,
    /// Name of the active profile.
    pub active_profile: Option<String>,
    /// Number of history entries.
    pub history_entries: usize,
    /// Record files that could not be read.
    pub skipped: Vec<ListingWarning>,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Templates: {}", self.templates.len())?;
        for name in &self.templates {
            writeln!(f, "  - {name}")?;
        }
        writeln!(f, "Auth profiles: {}", self.profiles.len())?;
        for profile in &self.profiles {
            let marker = if profile.active { " (active)" } else { "" };
            writeln!(f, "  - {} [{}]{marker}", profile.name, profile.kind)?;
        }
        writeln!(
            f,
            "Active profile: {}",
            self.active_profile.as_deref().unwrap_or("none")
        )?;
        writeln!(f, "History entries: {}", self.history_entries)?;
        if !self.skipped.is_empty() {
            writeln!(f, "Skipped unreadable records: {}", self.skipped.len())?;
        }
        Ok(())
    }
}
