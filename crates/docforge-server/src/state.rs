//! Process-wide state shared across every request handler (§4.9, §5).

use crate::auth::{InMemoryPrincipalStore, PrincipalStore};
use crate::documents::DocumentRegistry;
use crate::settings::SettingsStore;
use docforge_core::storage::DocumentStorage;
use docforge_core::store::SectionStore;
use docforge_core::{Config, CredentialStore, InMemoryCredentialStore};
use docforge_jobs::{CommitEngine, JobScheduler, StreamHub};
use docforge_llm::LlmClient;
use std::sync::Arc;
use std::time::Duration;

/// Everything a handler needs, cloned cheaply (every field is an `Arc`)
/// and passed to axum as `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub storage: Arc<DocumentStorage>,
    pub store: Arc<SectionStore>,
    pub commit: Arc<CommitEngine>,
    pub scheduler: Arc<JobScheduler>,
    pub hub: Arc<StreamHub>,
    pub llm: Arc<LlmClient>,
    pub credentials: Arc<dyn CredentialStore>,
    pub principals: Arc<dyn PrincipalStore>,
    pub documents: Arc<DocumentRegistry>,
    pub settings: Arc<SettingsStore>,
}

impl AppState {
    /// Wires every component together the way `main` does at startup;
    /// split out so integration tests can build the same graph against a
    /// temp directory.
    pub fn new(config: Config) -> docforge_core::Result<Self> {
        let storage = Arc::new(DocumentStorage::new(config.upload_dir.clone()));
        let store = Arc::new(SectionStore::new((*storage).clone()));
        let commit = Arc::new(CommitEngine::new(
            Arc::clone(&storage),
            docforge_core::BackupPolicy::default(),
        ));
        let llm = Arc::new(LlmClient::new(Duration::from_secs(config.llm_timeout_s))?);
        let hub = Arc::new(StreamHub::new());
        let scheduler = Arc::new(JobScheduler::new(
            Arc::clone(&store),
            Arc::clone(&commit),
            Arc::clone(&llm),
            Arc::clone(&hub),
        ));

        Ok(Self {
            config: Arc::new(config),
            storage,
            store,
            commit,
            scheduler,
            hub,
            llm,
            credentials: Arc::new(InMemoryCredentialStore::new()),
            principals: Arc::new(InMemoryPrincipalStore::new()),
            documents: Arc::new(DocumentRegistry::new()),
            settings: Arc::new(SettingsStore::new()),
        })
    }
}
