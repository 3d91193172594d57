//! Backend selection and session acquisition shared by every command.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};
use uuid::Uuid;

use taskflow::board::account::AccountStore;
use taskflow::board::backend::{
    AccountBackend, EventBackend, MemoryBackend, TaskBackend, TeamBackend,
};
use taskflow::board::calendar::EventStore;
use taskflow::board::functions::{EdgeFunctions, OfflineFunctions};
use taskflow::board::models::Session;
use taskflow::board::rest::RestBackend;
use taskflow::board::store::TaskStore;
use taskflow::board::team::TeamStore;
use taskflow::config::TaskflowConfig;
use taskflow::errors::BoardError;

/// Everything a board command needs: who is signed in and where their data
/// lives.
pub struct Workspace {
    pub session: Session,
    pub tasks: Arc<dyn TaskBackend>,
    pub team: Arc<dyn TeamBackend>,
    pub events: Arc<dyn EventBackend>,
    pub account: Arc<dyn AccountBackend>,
    pub functions: Arc<dyn EdgeFunctions>,
}

impl Workspace {
    /// `--offline` gives a seeded in-memory board; otherwise the hosted
    /// backend with the cached session, or a fresh sign-in when
    /// `TASKFLOW_EMAIL`/`TASKFLOW_PASSWORD` are set.
    pub async fn open(config: &TaskflowConfig) -> Result<Self> {
        if config.offline {
            return Ok(Self::offline());
        }

        let settings = config.backend()?;
        let rest = Arc::new(RestBackend::new(settings.url, settings.anon_key));
        let session = match config.load_session()? {
            Some(session) => {
                debug!(user_id = %session.user_id, "using cached session");
                session
            }
            None => match (config.email(), config.password()) {
                (Some(email), Some(password)) => {
                    let session = rest
                        .sign_in(&email, &password)
                        .await
                        .context("Sign-in with TASKFLOW_EMAIL/TASKFLOW_PASSWORD failed")?;
                    config.save_session(&session)?;
                    info!(user_id = %session.user_id, "signed in from environment");
                    session
                }
                _ => {
                    return Err(BoardError::Unauthenticated(
                        "run 'taskflow login' first, or use --offline".to_string(),
                    )
                    .into());
                }
            },
        };

        Ok(Self {
            session,
            tasks: rest.clone(),
            team: rest.clone(),
            events: rest.clone(),
            account: rest.clone(),
            functions: rest,
        })
    }

    pub fn offline() -> Self {
        let session = Session {
            access_token: "offline".to_string(),
            user_id: Uuid::nil(),
            email: Some("offline@localhost".to_string()),
            expires_at: None,
        };
        let backend = Arc::new(MemoryBackend::seeded(session.user_id));
        Self {
            session,
            tasks: backend.clone(),
            team: backend.clone(),
            events: backend.clone(),
            account: backend,
            functions: Arc::new(OfflineFunctions::new()),
        }
    }

    pub fn task_store(&self) -> TaskStore {
        TaskStore::new(self.tasks.clone())
    }

    pub fn team_store(&self) -> TeamStore {
        TeamStore::new(self.team.clone(), self.functions.clone())
    }

    pub fn event_store(&self) -> EventStore {
        EventStore::new(self.events.clone())
    }

    pub fn account_store(&self) -> AccountStore {
        AccountStore::new(self.account.clone())
    }
}
