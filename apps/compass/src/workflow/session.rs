use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info};
use uuid::Uuid;

use crate::workflow::machine::{Workflow, WorkflowState};

/// How often the idle sweeper wakes up.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// One page view. The workflow lock is only held for single transitions.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub workflow: Mutex<Workflow>,
}

impl Session {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            workflow: Mutex::new(Workflow::new()),
        }
    }
}

/// In-memory registry of live sessions. Nothing survives a restart.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> Arc<Session> {
        let session = Arc::new(Session::new());
        self.sessions
            .write()
            .await
            .insert(session.id, Arc::clone(&session));
        debug!("Created session {}", session.id);
        session
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<Session>> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            debug!("Removed session {id}");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops sessions whose workflow has not changed for longer than `max_idle`.
    /// Sessions with a cycle in flight, or whose lock is currently held, are kept.
    /// Returns how many were dropped.
    pub async fn sweep_idle(&self, max_idle: Duration) -> usize {
        let Ok(max_idle) = chrono::Duration::from_std(max_idle) else {
            return 0;
        };
        let cutoff = Utc::now() - max_idle;

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, session| match session.workflow.try_lock() {
            Ok(workflow) => {
                let keep = matches!(workflow.state(), WorkflowState::Submitting { .. })
                    || workflow.updated_at() > cutoff;
                if !keep {
                    debug!("Expired idle session {id}");
                }
                keep
            }
            Err(_) => true,
        });
        before - sessions.len()
    }

    /// Runs `sweep_idle` every `every` until the runtime shuts down.
    pub fn spawn_sweeper(&self, max_idle: Duration, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut timer = interval(every);
            // first tick fires immediately
            timer.tick().await;

            loop {
                timer.tick().await;
                let expired = store.sweep_idle(max_idle).await;
                if expired > 0 {
                    info!("Expired {expired} idle sessions");
                }
            }
        })
    }
}
