//! Debounced background persistence of the entity being edited.
//!
//! Every observed canvas change produces a candidate entity. Candidates that
//! differ from the last one restart a debounce timer; only the candidate
//! alive when the timer fires is written. Status moves
//! `Idle -> Saving -> Saved -> Idle` around each write and is published on a
//! [`tokio::sync::watch`] channel.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::entity::Template;
use crate::store::Library;
use crate::CanvasState;

/// Default quiet period before a write.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(450);

/// Default time `Saved` is shown before reverting to `Idle`.
pub const DEFAULT_IDLE_RESET: Duration = Duration::from_millis(700);

/// Autosave timing and teardown behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveConfig {
    /// Quiet period after the last change before writing.
    pub debounce: Duration,
    /// How long `Saved` lasts before `Idle`.
    pub idle_reset: Duration,
    /// Write the pending candidate on teardown instead of dropping it.
    pub flush_on_teardown: bool,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            idle_reset: DEFAULT_IDLE_RESET,
            flush_on_teardown: false,
        }
    }
}

impl AutosaveConfig {
    /// Set the debounce delay.
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Set the idle reset delay.
    #[must_use]
    pub fn with_idle_reset(mut self, idle_reset: Duration) -> Self {
        self.idle_reset = idle_reset;
        self
    }

    /// Write pending edits on teardown.
    #[must_use]
    pub fn with_flush_on_teardown(mut self, flush: bool) -> Self {
        self.flush_on_teardown = flush;
        self
    }
}

/// User-visible autosave state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutosaveStatus {
    /// Nothing in flight.
    #[default]
    Idle,
    /// A write is in progress.
    Saving,
    /// The last write completed.
    Saved,
}

impl AutosaveStatus {
    /// Indicator text.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Saving => "Saving…",
            Self::Saved => "Saved",
        }
    }
}

impl std::fmt::Display for AutosaveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

type PendingSlot = Arc<Mutex<Option<Template>>>;

/// Watches editor output and persists it through a [`Library`].
///
/// Must be driven from inside a tokio runtime; without one, changes are
/// written immediately.
#[derive(Debug)]
pub struct AutosaveCoordinator {
    library: Arc<Library>,
    config: AutosaveConfig,
    status: Arc<watch::Sender<AutosaveStatus>>,
    entity_id: Option<String>,
    last_snapshot: Option<String>,
    pending: PendingSlot,
    timer: Option<JoinHandle<()>>,
}

impl AutosaveCoordinator {
    /// Create a coordinator writing into `library`.
    #[must_use]
    pub fn new(library: Arc<Library>, config: AutosaveConfig) -> Self {
        let (status, _) = watch::channel(AutosaveStatus::Idle);
        Self {
            library,
            config,
            status: Arc::new(status),
            entity_id: None,
            last_snapshot: None,
            pending: Arc::new(Mutex::new(None)),
            timer: None,
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &AutosaveConfig {
        &self.config
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> AutosaveStatus {
        *self.status.borrow()
    }

    /// Receive status changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AutosaveStatus> {
        self.status.subscribe()
    }

    /// Whether an unwritten candidate is waiting on the debounce timer.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        lock(&self.pending).is_some()
    }

    /// Record the latest editor output for `entity`.
    ///
    /// Identical content to the last candidate is ignored. Switching to a
    /// different entity tears down the previous one first.
    pub fn observe(&mut self, entity: Option<&Template>, canvas: &CanvasState) {
        let Some(entity) = entity else {
            return;
        };

        if self.entity_id.as_deref() != Some(entity.id.as_str()) {
            if self.entity_id.is_some() {
                self.teardown();
            }
            self.entity_id = Some(entity.id.clone());
        }

        let candidate = entity.with_canvas(canvas);
        let snapshot = match candidate.snapshot() {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Failed to snapshot {}: {e}", candidate.id);
                return;
            }
        };
        if self.last_snapshot.as_ref() == Some(&snapshot) {
            return;
        }
        self.last_snapshot = Some(snapshot);

        tracing::debug!("Scheduling autosave of {}", candidate.id);
        *lock(&self.pending) = Some(candidate);
        self.cancel_timer();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                self.timer = Some(handle.spawn(debounced_write(
                    Arc::clone(&self.library),
                    Arc::clone(&self.pending),
                    Arc::clone(&self.status),
                    self.config,
                )));
            }
            Err(_) => {
                tracing::warn!("No async runtime; autosaving immediately");
                self.write_pending();
            }
        }
    }

    /// Write the pending candidate now, skipping the rest of the debounce.
    /// Returns whether anything was written.
    pub fn flush(&mut self) -> bool {
        if !self.has_pending() {
            return false;
        }
        self.cancel_timer();
        if !self.write_pending() {
            return false;
        }
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let status = Arc::clone(&self.status);
            let idle_reset = self.config.idle_reset;
            self.timer = Some(handle.spawn(async move {
                tokio::time::sleep(idle_reset).await;
                status.send_replace(AutosaveStatus::Idle);
            }));
        }
        true
    }

    /// Stop watching the current entity and cancel its timers.
    ///
    /// The pending candidate is dropped unless
    /// [`AutosaveConfig::flush_on_teardown`] is set.
    pub fn teardown(&mut self) {
        self.cancel_timer();
        if self.config.flush_on_teardown {
            self.write_pending();
        } else if let Some(dropped) = lock(&self.pending).take() {
            tracing::debug!("Discarding unsaved changes to {}", dropped.id);
        }
        self.entity_id = None;
        self.last_snapshot = None;
        self.status.send_replace(AutosaveStatus::Idle);
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    fn write_pending(&self) -> bool {
        let Some(entity) = lock(&self.pending).take() else {
            return false;
        };
        persist(&self.library, &self.status, &entity);
        true
    }
}

impl Drop for AutosaveCoordinator {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn lock(slot: &PendingSlot) -> std::sync::MutexGuard<'_, Option<Template>> {
    slot.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn persist(library: &Library, status: &watch::Sender<AutosaveStatus>, entity: &Template) {
    status.send_replace(AutosaveStatus::Saving);
    if let Err(e) = library.save(entity) {
        tracing::warn!("Autosave of {} failed: {e}", entity.id);
    } else {
        tracing::debug!("Autosaved {}", entity.id);
    }
    status.send_replace(AutosaveStatus::Saved);
}

async fn debounced_write(
    library: Arc<Library>,
    pending: PendingSlot,
    status: Arc<watch::Sender<AutosaveStatus>>,
    config: AutosaveConfig,
) {
    tokio::time::sleep(config.debounce).await;
    let Some(entity) = lock(&pending).take() else {
        return;
    };
    persist(&library, &status, &entity);
    tokio::time::sleep(config.idle_reset).await;
    status.send_replace(AutosaveStatus::Idle);
}
