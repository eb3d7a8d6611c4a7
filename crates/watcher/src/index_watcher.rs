//! Per-workspace indexing observer
//!
//! An [`IndexWatcher`] listens to one workspace's indexing service and starts
//! a validation pass every time the state property transitions to
//! `Completed`. It never owns the workspace: if the host drops it, later
//! notifications are ignored.

use futures::future::join_all;
use intellisense_check_core::config::WatcherConfig;
use intellisense_check_core::error::Result;
use intellisense_check_core::host::Workspace;
use intellisense_check_core::model::{IndexProperties, IndexingChanged};
use intellisense_check_core::observer::{StateObserver, Subscription};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::validator::{ContextValidator, ValidationOutcome, ValidationRequest};

/// Starts validation passes when indexing of a workspace completes
pub struct IndexWatcher {
    workspace: Weak<dyn Workspace>,
    location: PathBuf,
    validator: Arc<ContextValidator>,
    request: ValidationRequest,
    cancel_in_flight: bool,
    runtime: Handle,
    subscription: Mutex<Option<Subscription>>,
    /// Cancels every pass this watcher started
    shutdown: CancellationToken,
    in_flight: Mutex<Option<CancellationToken>>,
    pending: Mutex<Vec<JoinHandle<Option<ValidationOutcome>>>>,
    passes_started: AtomicUsize,
}

impl IndexWatcher {
    /// Subscribe to `workspace`'s indexing notifications
    ///
    /// Passes are spawned on `runtime`, so notifications may arrive on any
    /// thread.
    pub fn attach(
        workspace: &Arc<dyn Workspace>,
        validator: Arc<ContextValidator>,
        request: ValidationRequest,
        config: &WatcherConfig,
        runtime: Handle,
    ) -> Result<Arc<Self>> {
        let watcher = Arc::new(Self {
            workspace: Arc::downgrade(workspace),
            location: workspace.location().to_path_buf(),
            validator,
            request,
            cancel_in_flight: config.cancel_in_flight,
            runtime,
            subscription: Mutex::new(None),
            shutdown: CancellationToken::new(),
            in_flight: Mutex::new(None),
            pending: Mutex::new(Vec::new()),
            passes_started: AtomicUsize::new(0),
        });

        let observer: Arc<dyn StateObserver<IndexingChanged>> = watcher.clone();
        let subscription = workspace.subscribe_indexing_changed(observer)?;
        *watcher
            .subscription
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(subscription);

        debug!("Index watcher attached to {:?}", watcher.location);
        Ok(watcher)
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Number of validation passes started so far
    pub fn passes_started(&self) -> usize {
        self.passes_started.load(Ordering::SeqCst)
    }

    /// Passes whose handles are still held for [`IndexWatcher::wait_idle`]
    pub fn pending_passes(&self) -> usize {
        self.pending
            .lock()
            .map(|pending| pending.len())
            .unwrap_or(0)
    }

    pub fn is_attached(&self) -> bool {
        self.subscription
            .lock()
            .map(|subscription| subscription.is_some())
            .unwrap_or(false)
    }

    /// Unsubscribe and cancel any pass still running
    pub fn detach(&self) {
        let subscription = self
            .subscription
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
            info!("Index watcher detached from {:?}", self.location);
        }
        self.shutdown.cancel();
    }

    /// Wait for every pass started so far, including ones started meanwhile
    ///
    /// Returns the outcomes of passes that completed; abandoned passes are
    /// left out, as are passes released when a later pass started.
    pub async fn wait_idle(&self) -> Vec<ValidationOutcome> {
        let mut outcomes = Vec::new();
        loop {
            let handles =
                std::mem::take(&mut *self.pending.lock().unwrap_or_else(|e| e.into_inner()));
            if handles.is_empty() {
                break;
            }
            for result in join_all(handles).await {
                match result {
                    Ok(Some(outcome)) => outcomes.push(outcome),
                    Ok(None) => {}
                    Err(e) => warn!("Validation pass for {:?} panicked: {}", self.location, e),
                }
            }
        }
        outcomes
    }

    fn start_pass(&self, workspace: Arc<dyn Workspace>) {
        let cancel = self.shutdown.child_token();
        if self.cancel_in_flight {
            let previous = self
                .in_flight
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .replace(cancel.clone());
            if let Some(previous) = previous {
                debug!("Cancelling in-flight pass for {:?}", self.location);
                previous.cancel();
            }
        }

        let pass = self.passes_started.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Starting validation pass {} for {:?}", pass, self.location);

        let validator = Arc::clone(&self.validator);
        let request = self.request.clone();
        let handle = self
            .runtime
            .spawn(async move { validator.run_pass(workspace, &request, cancel).await });

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        // Finished passes have already reported; release their handles
        pending.retain(|handle| !handle.is_finished());
        pending.push(handle);
    }
}

impl StateObserver<IndexingChanged> for IndexWatcher {
    fn on_state_changed(&self, event: &IndexingChanged) {
        if !event.changed.contains(IndexProperties::STATE) {
            trace!("Ignoring non-state indexing change {:?}", event.changed);
            return;
        }

        let Some(workspace) = self.workspace.upgrade() else {
            debug!("Workspace {:?} is gone; ignoring indexing change", self.location);
            return;
        };

        let state = workspace.indexing_state();
        if !state.is_completed() {
            trace!("Indexing of {:?} is {}", self.location, state);
            return;
        }

        self.start_pass(workspace);
    }
}
