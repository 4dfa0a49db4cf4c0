//! Simulated live refresh of the HRV reading.
//!
//! Stands in for a future backend fetch: after a delay the current RMSSD is
//! nudged by a small random offset. The task is owned by a [`RefreshHandle`];
//! dropping or cancelling the handle stops it before it touches the store.

use crate::models::HrvUpdate;
use crate::store::BioDataStore;
use rand::Rng;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Store shared between a UI layer and background tasks.
pub type SharedBioDataStore = Arc<RwLock<BioDataStore>>;

/// Delay before the simulated fetch lands.
pub const INITIAL_FETCH_DELAY: Duration = Duration::from_secs(5);

/// RMSSD used as the base when the store has no (or a zero) current reading.
const FALLBACK_RMSSD: f64 = 60.0;

/// Offset applied to the RMSSD, in ms.
const RMSSD_JITTER: Range<i32> = -5..5;

pub fn shared(store: BioDataStore) -> SharedBioDataStore {
    Arc::new(RwLock::new(store))
}

/// Owner of a running refresh task.
pub struct RefreshHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    /// Stop the task if it has not applied its update yet.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the task to finish (after applying its update or being cancelled).
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Bio-data refresh task failed");
            }
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Spawn the simulated initial fetch on the current tokio runtime.
pub fn spawn_initial_fetch(store: SharedBioDataStore, delay: Duration) -> RefreshHandle {
    let token = CancellationToken::new();
    let task_token = token.clone();

    let task = tokio::spawn(async move {
        tracing::info!(delay_ms = delay.as_millis() as u64, "Simulating initial bio data fetch");

        tokio::select! {
            _ = task_token.cancelled() => {
                tracing::debug!("Initial bio data fetch cancelled");
                return;
            }
            _ = tokio::time::sleep(delay) => {}
        }

        let mut store = store.write().await;
        if task_token.is_cancelled() {
            tracing::debug!("Initial bio data fetch cancelled");
            return;
        }

        let offset = rand::thread_rng().gen_range(RMSSD_JITTER);
        let base = store
            .hrv_current_rmssd()
            .filter(|rmssd| *rmssd != 0.0)
            .unwrap_or(FALLBACK_RMSSD);
        let update = HrvUpdate {
            current_rmssd: Some(base + f64::from(offset)),
            ..Default::default()
        };

        match store.update_hrv_data(update) {
            Ok(hrv) => tracing::info!(current_rmssd = ?hrv.current_rmssd, "Applied simulated HRV reading"),
            Err(e) => tracing::warn!(error = %e, "Simulated HRV reading rejected"),
        }
    });

    RefreshHandle {
        token,
        task: Some(task),
    }
}
