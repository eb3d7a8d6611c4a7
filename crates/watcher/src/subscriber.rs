//! Tracks the active workspace and keeps an index watcher attached to it

use intellisense_check_core::config::{Config, WatcherConfig};
use intellisense_check_core::host::{WorkspaceHost, WorkspaceService};
use intellisense_check_core::model::WorkspaceChanged;
use intellisense_check_core::observer::{StateObserver, Subscription};
use intellisense_check_core::report::Reporter;
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::index_watcher::IndexWatcher;
use crate::validator::{ContextValidator, ValidationOutcome, ValidationRequest};

/// Installs an [`IndexWatcher`] for whichever workspace the host activates
pub struct WorkspaceSubscriber {
    service: Arc<dyn WorkspaceService>,
    validator: Arc<ContextValidator>,
    request: ValidationRequest,
    config: WatcherConfig,
    runtime: Handle,
    subscription: Mutex<Option<Subscription>>,
    /// Watcher for the most recently activated workspace
    active: Mutex<Option<Arc<IndexWatcher>>>,
    /// Replaced watchers that were left subscribed
    retired: Mutex<Vec<Arc<IndexWatcher>>>,
}

impl WorkspaceSubscriber {
    /// Register with the host's workspace service
    ///
    /// Returns `None` when the host has no workspace service or when called
    /// outside a tokio runtime; nothing is installed in that case.
    pub fn install(
        host: &dyn WorkspaceHost,
        reporter: Arc<dyn Reporter>,
        config: &Config,
    ) -> Option<Arc<Self>> {
        let Some(service) = host.workspace_service() else {
            debug!("Host has no workspace service; validator not installed");
            return None;
        };
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("Validator not installed: no tokio runtime ({e})");
                return None;
            }
        };

        let subscriber = Arc::new(Self {
            service: Arc::clone(&service),
            validator: Arc::new(ContextValidator::new(reporter)),
            request: ValidationRequest::from_config(&config.validator),
            config: config.watcher.clone(),
            runtime,
            subscription: Mutex::new(None),
            active: Mutex::new(None),
            retired: Mutex::new(Vec::new()),
        });

        let observer: Arc<dyn StateObserver<WorkspaceChanged>> = subscriber.clone();
        let subscription = service.subscribe_workspace_changed(observer);
        *subscriber
            .subscription
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(subscription);

        info!("Workspace validator installed");
        Some(subscriber)
    }

    /// Watcher bound to the most recently activated workspace
    pub fn active_watcher(&self) -> Option<Arc<IndexWatcher>> {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Replaced watchers that are still subscribed to their old workspace
    pub fn retired_watchers(&self) -> Vec<Arc<IndexWatcher>> {
        self.retired
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Wait until every pass started by any live watcher has finished
    pub async fn wait_idle(&self) -> Vec<ValidationOutcome> {
        let mut watchers = self.retired_watchers();
        watchers.extend(self.active_watcher());

        let mut outcomes = Vec::new();
        for watcher in watchers {
            outcomes.extend(watcher.wait_idle().await);
        }
        outcomes
    }

    /// Stop observing workspace changes and detach every watcher
    pub fn shutdown(&self) {
        let subscription = self
            .subscription
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }

        let active = self.active.lock().unwrap_or_else(|e| e.into_inner()).take();
        let retired =
            std::mem::take(&mut *self.retired.lock().unwrap_or_else(|e| e.into_inner()));
        for watcher in retired.into_iter().chain(active) {
            watcher.detach();
        }
        info!("Workspace validator shut down");
    }

    fn replace_active(&self, watcher: Arc<IndexWatcher>) {
        let previous = self
            .active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(watcher);

        let Some(previous) = previous else {
            return;
        };
        if self.config.dispose_previous_watcher {
            previous.detach();
        } else {
            debug!(
                "Leaving index watcher for {:?} subscribed",
                previous.location()
            );
            self.retired
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(previous);
        }
    }
}

impl StateObserver<WorkspaceChanged> for WorkspaceSubscriber {
    fn on_state_changed(&self, _event: &WorkspaceChanged) {
        // Re-fetch rather than trusting the event; the host may have moved on
        let Some(workspace) = self.service.current_workspace() else {
            debug!("No active workspace");
            return;
        };

        match IndexWatcher::attach(
            &workspace,
            Arc::clone(&self.validator),
            self.request.clone(),
            &self.config,
            self.runtime.clone(),
        ) {
            Ok(watcher) => self.replace_active(watcher),
            Err(e) => warn!(
                "Failed to watch indexing of {:?}: {}",
                workspace.location(),
                e
            ),
        }
    }
}
