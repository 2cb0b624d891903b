// ABOUTME: Staging slot lock that serializes deployments sharing one staging root.
// ABOUTME: An async mutex plus a record of who holds it, released when the guard drops.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::types::DeploymentId;

/// Information about which deployment holds the slot.
#[derive(Debug, Clone, Serialize)]
pub struct SlotHolder {
    pub deployment_id: DeploymentId,
    /// When the slot was acquired.
    pub started_at: DateTime<Utc>,
}

impl SlotHolder {
    fn new(deployment_id: &DeploymentId) -> Self {
        Self {
            deployment_id: deployment_id.clone(),
            started_at: Utc::now(),
        }
    }
}

/// The single staging directory, shared by every request.
///
/// Stage, run and clean all happen while the slot is held, so a deployment
/// never sees another one's files. Waiters are served in arrival order.
#[derive(Debug, Clone, Default)]
pub struct StagingSlot {
    lock: Arc<Mutex<()>>,
    holder: Arc<parking_lot::Mutex<Option<SlotHolder>>>,
}

/// A held staging slot that releases on drop.
pub struct SlotGuard {
    holder: Arc<parking_lot::Mutex<Option<SlotHolder>>>,
    _guard: OwnedMutexGuard<()>,
}

impl std::fmt::Debug for SlotGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotGuard")
            .field("holder", &*self.holder.lock())
            .finish()
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        // Runs before `_guard` is dropped, so the next holder never sees a stale record.
        self.holder.lock().take();
    }
}

impl StagingSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the slot and take it for `deployment_id`.
    pub async fn acquire(&self, deployment_id: &DeploymentId) -> SlotGuard {
        if let Some(current) = self.holder() {
            tracing::info!(
                deployment = %deployment_id.short(),
                held_by = %current.deployment_id.short(),
                since = %current.started_at,
                "staging slot busy, waiting"
            );
        }

        let guard = self.lock.clone().lock_owned().await;
        *self.holder.lock() = Some(SlotHolder::new(deployment_id));
        tracing::debug!(deployment = %deployment_id.short(), "acquired staging slot");

        SlotGuard {
            holder: self.holder.clone(),
            _guard: guard,
        }
    }

    /// Take the slot only if it is free right now.
    pub fn try_acquire(&self, deployment_id: &DeploymentId) -> Option<SlotGuard> {
        let guard = self.lock.clone().try_lock_owned().ok()?;
        *self.holder.lock() = Some(SlotHolder::new(deployment_id));
        Some(SlotGuard {
            holder: self.holder.clone(),
            _guard: guard,
        })
    }

    /// Who holds the slot, if anyone.
    pub fn holder(&self) -> Option<SlotHolder> {
        self.holder.lock().clone()
    }
}
