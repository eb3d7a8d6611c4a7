//! In-memory host used by fixtures and tests
//!
//! Every capability in [`crate::host`] is backed by plain data here. State
//! changes are pushed to observers synchronously on the calling thread, the
//! same way a real host raises notifications from its own worker threads.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::host::{FileContext, ProjectContext, Workspace, WorkspaceHost, WorkspaceService};
use crate::model::{
    CommandLine, FileContextChanged, FileContextGroup, IndexProperties, IndexingChanged,
    IndexingState, IntelliSenseInfo, ProjectContextId, ProviderKey, ProviderTypeId,
    WorkspaceChanged,
};
use crate::observer::{ObserverList, StateObserver, Subscription};

/// Host with an optional folder-workspace service
pub struct MemoryHost {
    service: Option<Arc<MemoryWorkspaceService>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            service: Some(Arc::new(MemoryWorkspaceService::new())),
        }
    }

    /// A host that does not expose a workspace service at all
    pub fn without_workspace_service() -> Self {
        Self { service: None }
    }

    pub fn service(&self) -> Option<&Arc<MemoryWorkspaceService>> {
        self.service.as_ref()
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkspaceHost for MemoryHost {
    fn workspace_service(&self) -> Option<Arc<dyn WorkspaceService>> {
        self.service
            .as_ref()
            .map(|service| Arc::clone(service) as Arc<dyn WorkspaceService>)
    }
}

/// Holds the active workspace and announces changes to it
pub struct MemoryWorkspaceService {
    current: RwLock<Option<Arc<MemoryWorkspace>>>,
    observers: ObserverList<WorkspaceChanged>,
}

impl MemoryWorkspaceService {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
            observers: ObserverList::new(),
        }
    }

    /// Make `workspace` the active one (or close the active one) and notify
    pub fn activate(&self, workspace: Option<Arc<MemoryWorkspace>>) {
        let location = workspace.as_ref().map(|ws| ws.location().to_path_buf());
        if let Ok(mut current) = self.current.write() {
            *current = workspace;
        }
        debug!("Active workspace changed to {:?}", location);
        self.observers.notify(&WorkspaceChanged { location });
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

impl Default for MemoryWorkspaceService {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkspaceService for MemoryWorkspaceService {
    fn current_workspace(&self) -> Option<Arc<dyn Workspace>> {
        self.current
            .read()
            .ok()
            .and_then(|current| current.clone())
            .map(|ws| ws as Arc<dyn Workspace>)
    }

    fn subscribe_workspace_changed(
        &self,
        observer: Arc<dyn StateObserver<WorkspaceChanged>>,
    ) -> Subscription {
        self.observers.subscribe(observer)
    }
}

/// Workspace whose indexing state and file contexts are set by the caller
pub struct MemoryWorkspace {
    location: PathBuf,
    state: RwLock<IndexingState>,
    /// `None` models a workspace without an indexing service
    indexing_observers: Option<ObserverList<IndexingChanged>>,
    files: RwLock<Vec<Arc<MemoryFileContext>>>,
    query_delay: Option<Duration>,
    queries: AtomicUsize,
}

impl MemoryWorkspace {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            state: RwLock::new(IndexingState::NotStarted),
            indexing_observers: Some(ObserverList::new()),
            files: RwLock::new(Vec::new()),
            query_delay: None,
            queries: AtomicUsize::new(0),
        }
    }

    pub fn without_indexing_service(mut self) -> Self {
        self.indexing_observers = None;
        self
    }

    /// Make every file-context query take at least `delay`
    pub fn with_query_delay(mut self, delay: Duration) -> Self {
        self.query_delay = Some(delay);
        self
    }

    pub fn add_file(&self, file: MemoryFileContext) -> Arc<MemoryFileContext> {
        let file = Arc::new(file);
        if let Ok(mut files) = self.files.write() {
            files.push(Arc::clone(&file));
        }
        file
    }

    /// Change the state and raise a STATE property notification
    pub fn set_indexing_state(&self, state: IndexingState) {
        if let Ok(mut current) = self.state.write() {
            *current = state;
        }
        self.notify_property_change(IndexProperties::STATE);
    }

    /// Raise a notification for `changed` without touching the state
    pub fn notify_property_change(&self, changed: IndexProperties) {
        let event = IndexingChanged::new(changed, self.indexing_state());
        trace!("Indexing properties {:?} changed at {:?}", changed, self.location);
        if let Some(observers) = &self.indexing_observers {
            observers.notify(&event);
        }
    }

    pub fn indexing_observer_count(&self) -> usize {
        self.indexing_observers
            .as_ref()
            .map(|observers| observers.len())
            .unwrap_or(0)
    }

    /// Number of file-context queries answered so far
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn files(&self) -> Vec<Arc<MemoryFileContext>> {
        self.files
            .read()
            .map(|files| files.clone())
            .unwrap_or_default()
    }

    fn collect_groups(&self, scope: &Path, provider_types: &[ProviderTypeId]) -> Vec<FileContextGroup> {
        let scope_root = self.location.join(scope);
        let mut groups: Vec<FileContextGroup> = Vec::new();

        for file in self.files() {
            if !provider_types.is_empty() && !provider_types.contains(&file.provider_type) {
                continue;
            }
            if !file.path.starts_with(&scope_root) {
                continue;
            }

            let context = Arc::clone(&file) as Arc<dyn FileContext>;
            match groups
                .iter_mut()
                .find(|group| group.provider.name == file.provider_name)
            {
                Some(group) => group.contexts.push(context),
                None => groups.push(FileContextGroup::new(
                    ProviderKey::new(file.provider_name.clone(), vec![file.provider_type]),
                    vec![context],
                )),
            }
        }
        groups
    }
}

#[async_trait]
impl Workspace for MemoryWorkspace {
    fn location(&self) -> &Path {
        &self.location
    }

    fn indexing_state(&self) -> IndexingState {
        self.state.read().map(|state| *state).unwrap_or_default()
    }

    fn subscribe_indexing_changed(
        &self,
        observer: Arc<dyn StateObserver<IndexingChanged>>,
    ) -> Result<Subscription> {
        let observers = self.indexing_observers.as_ref().ok_or_else(|| {
            Error::capability_unavailable(format!(
                "No indexing service for workspace {}",
                self.location.display()
            ))
        })?;
        Ok(observers.subscribe(observer))
    }

    async fn query_file_contexts(
        &self,
        scope: &Path,
        provider_types: &[ProviderTypeId],
        cancel: CancellationToken,
    ) -> Result<Vec<FileContextGroup>> {
        if let Some(delay) = self.query_delay {
            tokio::select! {
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.collect_groups(scope, provider_types))
    }
}

/// File context produced by a named provider
pub struct MemoryFileContext {
    path: PathBuf,
    provider_name: String,
    provider_type: ProviderTypeId,
    project: Option<Arc<MemoryProjectContext>>,
    observers: ObserverList<FileContextChanged>,
}

impl MemoryFileContext {
    pub fn new(
        path: impl Into<PathBuf>,
        provider_name: impl Into<String>,
        provider_type: ProviderTypeId,
    ) -> Self {
        Self {
            path: path.into(),
            provider_name: provider_name.into(),
            provider_type,
            project: None,
            observers: ObserverList::new(),
        }
    }

    pub fn with_project(mut self, project: Arc<MemoryProjectContext>) -> Self {
        self.project = Some(project);
        self
    }

    /// Announce that the provider refreshed this context
    pub fn touch(&self) -> usize {
        self.observers.notify(&FileContextChanged {
            path: self.path.clone(),
        })
    }

    pub fn change_observer_count(&self) -> usize {
        self.observers.len()
    }
}

impl FileContext for MemoryFileContext {
    fn path(&self) -> &Path {
        &self.path
    }

    fn provider_type(&self) -> ProviderTypeId {
        self.provider_type
    }

    fn project_context(&self) -> Option<Arc<dyn ProjectContext>> {
        self.project
            .as_ref()
            .map(|project| Arc::clone(project) as Arc<dyn ProjectContext>)
    }

    fn subscribe_changed(
        &self,
        observer: Arc<dyn StateObserver<FileContextChanged>>,
    ) -> Subscription {
        self.observers.subscribe(observer)
    }
}

/// Project context with a fixed set of command lines
pub struct MemoryProjectContext {
    id: ProjectContextId,
    name: String,
    info: RwLock<IntelliSenseInfo>,
    info_requests: AtomicUsize,
}

impl MemoryProjectContext {
    pub fn new(name: impl Into<String>, command_lines: Vec<CommandLine>) -> Self {
        Self {
            id: ProjectContextId::new_v4(),
            name: name.into(),
            info: RwLock::new(IntelliSenseInfo::new(command_lines)),
            info_requests: AtomicUsize::new(0),
        }
    }

    pub fn set_command_lines(&self, command_lines: Vec<CommandLine>) {
        if let Ok(mut info) = self.info.write() {
            *info = IntelliSenseInfo::new(command_lines);
        }
    }

    /// How many times the validator asked for IntelliSense info
    pub fn info_requests(&self) -> usize {
        self.info_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProjectContext for MemoryProjectContext {
    fn id(&self) -> ProjectContextId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn intellisense_info(&self) -> Result<IntelliSenseInfo> {
        self.info_requests.fetch_add(1, Ordering::SeqCst);
        self.info
            .read()
            .map(|info| info.clone())
            .map_err(|_| Error::host(format!("IntelliSense info for {} is poisoned", self.name)))
    }
}
