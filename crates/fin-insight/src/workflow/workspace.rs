use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::controller::FormController;
use super::kind::{LoanCheck, SegmentAnalysis};
use crate::identity::{AuthContext, IdentityGateway, IdentityProvider};
use crate::inference::InferenceService;

pub const DEFAULT_IDLE_MINUTES: i64 = 30;
pub const DEFAULT_PRUNE_INTERVAL_SECS: i64 = 60;
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Everything one visitor owns: their session and both forms.
pub struct Workspace {
    id: Uuid,
    gateway: IdentityGateway,
    loan: FormController<LoanCheck>,
    segment: FormController<SegmentAnalysis>,
    last_seen: Mutex<DateTime<Utc>>,
}

impl Workspace {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        service: Arc<dyn InferenceService>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            gateway: IdentityGateway::new(provider, AuthContext::new()),
            loan: FormController::new(Arc::clone(&service)),
            segment: FormController::new(service),
            last_seen: Mutex::new(Utc::now()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn gateway(&self) -> &IdentityGateway {
        &self.gateway
    }

    pub fn loan(&self) -> &FormController<LoanCheck> {
        &self.loan
    }

    pub fn segment(&self) -> &FormController<SegmentAnalysis> {
        &self.segment
    }

    /// Signs out and throws away both forms and their results.
    pub async fn logout(&self) {
        self.gateway.logout().await;
        self.loan.reset();
        self.segment.reset();
    }

    fn touch(&self, now: DateTime<Utc>) {
        *self.last_seen.lock().expect("workspace clock poisoned") = now;
    }

    fn idle_since(&self) -> DateTime<Utc> {
        *self.last_seen.lock().expect("workspace clock poisoned")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("workspace registry is full ({capacity} live workspaces)")]
    Full { capacity: usize },
}

/// Live workspaces keyed by the visitor cookie.
///
/// Only signed-in visitors are registered. Anonymous visitors never own a
/// workspace, so cookieless traffic cannot grow the map.
pub struct WorkspaceRegistry {
    provider: Arc<dyn IdentityProvider>,
    service: Arc<dyn InferenceService>,
    idle_ttl: Duration,
    prune_interval: Duration,
    capacity: usize,
    last_pruned: Mutex<DateTime<Utc>>,
    workspaces: RwLock<HashMap<Uuid, Arc<Workspace>>>,
}

impl WorkspaceRegistry {
    pub fn new(provider: Arc<dyn IdentityProvider>, service: Arc<dyn InferenceService>) -> Self {
        Self {
            provider,
            service,
            idle_ttl: Duration::minutes(DEFAULT_IDLE_MINUTES),
            prune_interval: Duration::seconds(DEFAULT_PRUNE_INTERVAL_SECS),
            capacity: DEFAULT_CAPACITY,
            last_pruned: Mutex::new(Utc::now()),
            workspaces: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_idle_ttl(mut self, idle_ttl: Duration) -> Self {
        self.idle_ttl = idle_ttl;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Looks up a registered workspace. Unknown and expired ids yield `None`.
    pub fn find(&self, id: Option<Uuid>) -> Option<Arc<Workspace>> {
        let id = id?;
        let now = Utc::now();
        self.prune_if_due(now);

        let workspace = self
            .workspaces
            .read()
            .expect("workspace registry poisoned")
            .get(&id)
            .cloned()?;
        if now - workspace.idle_since() > self.idle_ttl {
            return None;
        }
        workspace.touch(now);
        Some(workspace)
    }

    /// Builds a workspace that is not yet reachable by any cookie.
    pub fn open(&self) -> Arc<Workspace> {
        Arc::new(Workspace::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.service),
        ))
    }

    /// Registers `workspace` under its own id and drops `replaces`, if any.
    pub fn admit(
        &self,
        workspace: Arc<Workspace>,
        replaces: Option<Uuid>,
    ) -> Result<(), RegistryError> {
        let now = Utc::now();
        let mut guard = self.workspaces.write().expect("workspace registry poisoned");
        if let Some(old) = replaces {
            guard.remove(&old);
        }
        if guard.len() >= self.capacity {
            self.retain_live(&mut guard, now);
        }
        if guard.len() >= self.capacity {
            warn!(capacity = self.capacity, "workspace registry full");
            return Err(RegistryError::Full {
                capacity: self.capacity,
            });
        }
        workspace.touch(now);
        debug!(workspace = %workspace.id(), replaced = ?replaces, "workspace admitted");
        guard.insert(workspace.id(), workspace);
        Ok(())
    }

    /// Forgets a workspace; its cookie stops resolving immediately.
    pub fn discard(&self, id: Uuid) -> Option<Arc<Workspace>> {
        self.workspaces
            .write()
            .expect("workspace registry poisoned")
            .remove(&id)
    }

    pub fn len(&self) -> usize {
        self.workspaces
            .read()
            .expect("workspace registry poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops workspaces idle for longer than the configured TTL.
    pub fn prune(&self, now: DateTime<Utc>) -> usize {
        *self.last_pruned.lock().expect("workspace clock poisoned") = now;
        let mut guard = self.workspaces.write().expect("workspace registry poisoned");
        self.retain_live(&mut guard, now)
    }

    /// Prunes at most once per interval.
    fn prune_if_due(&self, now: DateTime<Utc>) {
        {
            let mut last = self.last_pruned.lock().expect("workspace clock poisoned");
            if now - *last < self.prune_interval {
                return;
            }
            *last = now;
        }
        let mut guard = self.workspaces.write().expect("workspace registry poisoned");
        self.retain_live(&mut guard, now);
    }

    fn retain_live(
        &self,
        workspaces: &mut HashMap<Uuid, Arc<Workspace>>,
        now: DateTime<Utc>,
    ) -> usize {
        let before = workspaces.len();
        workspaces.retain(|_, workspace| now - workspace.idle_since() <= self.idle_ttl);
        let dropped = before - workspaces.len();
        if dropped > 0 {
            info!(dropped, "expired workspaces discarded");
        }
        dropped
    }
}
