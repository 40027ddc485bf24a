//! Debounced background saving.
//!
//! One task owns one debounce deadline and one periodic backup timer:
//!
//! ```text
//! notify(state) ─▶ latest = state, deadline = now + debounce
//! deadline      ─▶ save latest
//! interval tick ─▶ save latest (backup)
//! save_now()    ─▶ save latest immediately, report the result
//! shutdown()    ─▶ flush, then stop
//! ```
//!
//! A save is skipped when the serialized document equals the last one saved
//! successfully. Failures are logged and leave the in-memory document alone;
//! the next deadline or backup tick retries.

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::AutosaveConfig;
use crate::persist::{DocumentStore, PersistError};
use crate::DocumentState;

/// Progress of the most recent save.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveStatus {
    /// Nothing to save yet.
    #[default]
    Idle,
    /// Changes are waiting for the debounce to expire.
    Pending,
    /// A save is in flight.
    Saving,
    /// Everything is saved.
    Saved,
    /// The last save failed.
    Failed(String),
}

enum Command {
    Changed(Box<DocumentState>),
    Flush(oneshot::Sender<Result<(), PersistError>>),
    Shutdown(oneshot::Sender<()>),
}

/// Sending side of the autosave task. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AutosaveHandle {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<SaveStatus>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Changed(_) => f.write_str("Changed"),
            Self::Flush(_) => f.write_str("Flush"),
            Self::Shutdown(_) => f.write_str("Shutdown"),
        }
    }
}

impl AutosaveHandle {
    /// Record the latest document. Never blocks.
    pub fn notify(&self, document: &DocumentState) {
        if self
            .commands
            .send(Command::Changed(Box::new(document.clone())))
            .is_err()
        {
            tracing::debug!("Autosave task has stopped; change not queued");
        }
    }

    /// Save the latest document now.
    ///
    /// # Errors
    ///
    /// Returns the store's error, or [`PersistError::Unavailable`] if the
    /// autosave task has stopped.
    pub async fn save_now(&self) -> Result<(), PersistError> {
        let (reply, result) = oneshot::channel();
        self.commands
            .send(Command::Flush(reply))
            .map_err(|_| stopped())?;
        result.await.map_err(|_| stopped())?
    }

    /// Status of the most recent save.
    #[must_use]
    pub fn status(&self) -> SaveStatus {
        self.status.borrow().clone()
    }

    /// Watch status changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.status.clone()
    }

    /// Flush any pending change and stop the task.
    pub async fn shutdown(&self) {
        let (reply, done) = oneshot::channel();
        if self.commands.send(Command::Shutdown(reply)).is_ok() {
            // An error here means the task already exited.
            let _ = done.await;
        }
    }
}

fn stopped() -> PersistError {
    PersistError::Unavailable("autosave task has stopped".into())
}

/// The autosave task.
pub struct AutosaveBridge<S> {
    store: S,
    config: AutosaveConfig,
    latest: Option<DocumentState>,
    last_saved: Option<String>,
    status: watch::Sender<SaveStatus>,
}

impl<S: DocumentStore + 'static> AutosaveBridge<S> {
    /// Start the autosave task on the current tokio runtime.
    #[must_use]
    pub fn spawn(store: S, config: AutosaveConfig) -> (AutosaveHandle, JoinHandle<()>) {
        let (commands, receiver) = mpsc::unbounded_channel();
        let (status, status_rx) = watch::channel(SaveStatus::Idle);
        let bridge = Self {
            store,
            config,
            latest: None,
            last_saved: None,
            status,
        };
        let task = tokio::spawn(bridge.run(receiver));
        (
            AutosaveHandle {
                commands,
                status: status_rx,
            },
            task,
        )
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let enabled = self.config.enabled;
        let period = self.config.interval();
        let mut backup = tokio::time::interval_at(Instant::now() + period, period);
        backup.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut deadline: Option<Instant> = None;

        tracing::debug!(
            enabled,
            debounce_ms = self.config.debounce_ms,
            interval_ms = self.config.interval_ms,
            "Autosave started"
        );

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Changed(document)) => {
                        self.latest = Some(*document);
                        if enabled {
                            deadline = Some(Instant::now() + self.config.debounce());
                            self.status.send_replace(SaveStatus::Pending);
                        }
                    }
                    Some(Command::Flush(reply)) => {
                        deadline = None;
                        // The requester may have gone away; the save still happened.
                        let _ = reply.send(self.save_latest().await);
                    }
                    Some(Command::Shutdown(reply)) => {
                        self.save_logged().await;
                        let _ = reply.send(());
                        break;
                    }
                    None => {
                        self.save_logged().await;
                        break;
                    }
                },
                () = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    deadline = None;
                    self.save_logged().await;
                }
                _ = backup.tick(), if enabled => {
                    self.save_logged().await;
                }
            }
        }
        tracing::debug!("Autosave stopped");
    }

    async fn save_logged(&mut self) {
        if let Err(e) = self.save_latest().await {
            tracing::warn!("Autosave failed: {e}");
        }
    }

    async fn save_latest(&mut self) -> Result<(), PersistError> {
        let Some(document) = &self.latest else {
            return Ok(());
        };
        let json = serde_json::to_string(document)?;
        if self.last_saved.as_deref() == Some(json.as_str()) {
            self.status.send_replace(SaveStatus::Saved);
            return Ok(());
        }

        self.status.send_replace(SaveStatus::Saving);
        match self.store.save(document).await {
            Ok(()) => {
                tracing::info!(layers = document.layer_count(), "Document saved");
                self.last_saved = Some(json);
                self.status.send_replace(SaveStatus::Saved);
                Ok(())
            }
            Err(e) => {
                self.status.send_replace(SaveStatus::Failed(e.to_string()));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStore;
    use crate::{Layer, TextStyle};
    use std::time::Duration;

    fn doc(text: &str) -> DocumentState {
        let mut doc = DocumentState::default();
        doc.add_layer(Layer::text(TextStyle::new(text)).with_id("t"))
            .expect("add");
        doc
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_coalesces_changes() {
        let store = MemoryStore::new();
        let (handle, _task) = AutosaveBridge::spawn(store.clone(), AutosaveConfig::default());

        handle.notify(&doc("a"));
        sleep_ms(300).await;
        handle.notify(&doc("b"));
        sleep_ms(300).await;
        handle.notify(&doc("c"));
        sleep_ms(900).await;
        assert_eq!(store.saves(), 0);
        assert_eq!(handle.status(), SaveStatus::Pending);

        sleep_ms(200).await;
        assert_eq!(store.saves(), 1);
        assert_eq!(store.stored(), Some(doc("c")));
        assert_eq!(handle.status(), SaveStatus::Saved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backup_skips_unchanged_and_retries_failures() {
        let store = MemoryStore::new();
        let (handle, _task) = AutosaveBridge::spawn(store.clone(), AutosaveConfig::default());

        handle.notify(&doc("a"));
        sleep_ms(1100).await;
        assert_eq!(store.saves(), 1);

        store.set_failing(true);
        handle.notify(&doc("b"));
        sleep_ms(1100).await;
        assert!(matches!(handle.status(), SaveStatus::Failed(_)));
        assert_eq!(store.stored(), Some(doc("a")));

        // The backup tick at 5s retries the failed save.
        store.set_failing(false);
        sleep_ms(2900).await;
        assert_eq!(store.saves(), 2);
        assert_eq!(store.stored(), Some(doc("b")));

        // Nothing changed since, so later ticks do not save again.
        sleep_ms(10_000).await;
        assert_eq!(store.saves(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_now_reports_result() {
        let store = MemoryStore::new();
        let (handle, _task) = AutosaveBridge::spawn(store.clone(), AutosaveConfig::default());

        handle.notify(&doc("a"));
        handle.save_now().await.expect("save");
        assert_eq!(store.saves(), 1);

        store.set_failing(true);
        handle.notify(&doc("b"));
        assert!(handle.save_now().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_flushes_pending_change() {
        let store = MemoryStore::new();
        let (handle, task) = AutosaveBridge::spawn(store.clone(), AutosaveConfig::default());

        handle.notify(&doc("last words"));
        handle.shutdown().await;
        task.await.expect("task");

        assert_eq!(store.stored(), Some(doc("last words")));
        assert!(handle.save_now().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_autosave_only_saves_on_request() {
        let store = MemoryStore::new();
        let config = AutosaveConfig {
            enabled: false,
            ..AutosaveConfig::default()
        };
        let (handle, _task) = AutosaveBridge::spawn(store.clone(), config);

        handle.notify(&doc("a"));
        sleep_ms(20_000).await;
        assert_eq!(store.saves(), 0);

        handle.save_now().await.expect("save");
        assert_eq!(store.saves(), 1);
    }
}
