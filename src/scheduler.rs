//! Background reclamation of expired write locks.
//!
//! The scheduler lists the store on a fixed interval and removes every lock
//! whose deadline has passed. Removal goes through the store's compare-and-set
//! with the exact record that was found expired, so a lock renewed between the
//! listing and the removal is left alone.

use crate::clock::Clock;
use crate::error::RoadlockError;
use crate::locks::{LockPolicy, WriteLock};
use crate::store::LockStore;
use crossbeam::channel::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Callback invoked for each reclaimed lock.
pub type ReclaimHook = Arc<dyn Fn(&WriteLock) + Send + Sync>;

/// Outcome of one sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Locks removed by this sweep.
    pub reclaimed: Vec<WriteLock>,
    /// Expired locks whose key was busy or changed; retried next tick.
    pub contended: Vec<String>,
    /// Store failures, one per affected roadmap (or `"*"` for the listing).
    pub errors: Vec<(String, RoadlockError)>,
    /// Number of records examined.
    pub scanned: usize,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.contended.is_empty() && self.errors.is_empty()
    }
}

pub struct ExpiryScheduler<S, C> {
    store: S,
    clock: C,
    policy: LockPolicy,
    on_reclaim: Option<ReclaimHook>,
}

impl<S: LockStore, C: Clock> ExpiryScheduler<S, C> {
    pub fn new(store: S, clock: C, policy: LockPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
            on_reclaim: None,
        }
    }

    /// Register a callback run after each successful reclamation.
    pub fn on_reclaim(mut self, hook: ReclaimHook) -> Self {
        self.on_reclaim = Some(hook);
        self
    }

    pub fn with_policy(mut self, policy: LockPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &LockPolicy {
        &self.policy
    }

    /// Run a single reclamation pass.
    ///
    /// Never fails: store errors are logged and collected in the report.
    pub fn sweep_once(&self) -> SweepReport {
        let mut report = SweepReport::default();
        let now = self.clock.now();

        let locks = match self.store.list() {
            Ok(locks) => locks,
            Err(e) => {
                tracing::warn!(error = %e, "sweep failed to list locks");
                report.errors.push(("*".to_string(), e));
                return report;
            }
        };
        report.scanned = locks.len();

        for lock in locks {
            if !self.policy.is_expired(lock.expires_at, now) {
                continue;
            }

            let roadmap_id = lock.roadmap_id.clone();
            match self.store.compare_and_set(&roadmap_id, Some(&lock), None) {
                Ok(true) => {
                    tracing::info!(
                        roadmap = %roadmap_id,
                        holder = %lock.holder_id,
                        expired_at = %lock.expires_at,
                        "reclaimed expired write lock"
                    );
                    if let Some(hook) = &self.on_reclaim {
                        hook(&lock);
                    }
                    report.reclaimed.push(lock);
                }
                Ok(false) => {
                    tracing::debug!(roadmap = %roadmap_id, "expired lock changed or busy; skipping");
                    report.contended.push(roadmap_id);
                }
                Err(e) => {
                    tracing::warn!(roadmap = %roadmap_id, error = %e, "failed to reclaim lock");
                    report.errors.push((roadmap_id, e));
                }
            }
        }

        report
    }
}

impl<S, C> ExpiryScheduler<S, C>
where
    S: LockStore + 'static,
    C: Clock + 'static,
{
    /// Run sweeps on a background thread every `policy.sweep_interval()`.
    ///
    /// The first sweep happens one interval after spawning.
    pub fn spawn(self) -> std::io::Result<SchedulerHandle> {
        let interval = self
            .policy
            .sweep_interval()
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(1));
        let (shutdown_tx, shutdown_rx) = channel::bounded::<()>(1);

        let thread = thread::Builder::new()
            .name("roadlock-sweeper".to_string())
            .spawn(move || {
                let ticker = channel::tick(interval);
                tracing::debug!(interval_ms = interval.as_millis() as u64, "sweeper started");
                loop {
                    crossbeam::select! {
                        recv(ticker) -> _ => {
                            self.sweep_once();
                        }
                        recv(shutdown_rx) -> _ => break,
                    }
                }
                tracing::debug!("sweeper stopped");
            })?;

        Ok(SchedulerHandle {
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }
}

/// Handle to a running sweeper thread. Dropping it stops the thread.
pub struct SchedulerHandle {
    shutdown: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Signal the sweeper and wait for it to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        // Dropping the sender disconnects the channel, which wakes the select.
        self.shutdown.take();
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            tracing::warn!("sweeper thread panicked");
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
