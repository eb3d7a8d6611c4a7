//! Capabilities consumed from the host environment
//!
//! The validator never owns any of these objects. Workspaces, file contexts
//! and project contexts are created by the host and handed out as shared
//! references for the duration of a single callback or validation pass.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::model::{
    FileContextChanged, FileContextGroup, IndexingChanged, IndexingState, IntelliSenseInfo,
    ProjectContextId, ProviderTypeId, WorkspaceChanged,
};
use crate::observer::{StateObserver, Subscription};

/// Entry point into the host: service discovery
pub trait WorkspaceHost: Send + Sync {
    /// The folder-workspace service, if the host provides one
    fn workspace_service(&self) -> Option<Arc<dyn WorkspaceService>>;
}

/// Tracks which workspace is currently active
pub trait WorkspaceService: Send + Sync {
    /// The active workspace; may change or disappear between calls
    fn current_workspace(&self) -> Option<Arc<dyn Workspace>>;

    fn subscribe_workspace_changed(
        &self,
        observer: Arc<dyn StateObserver<WorkspaceChanged>>,
    ) -> Subscription;
}

/// A host-managed project root
#[async_trait]
pub trait Workspace: Send + Sync {
    /// Root directory of the workspace
    fn location(&self) -> &Path;

    /// Current state of the indexing service
    fn indexing_state(&self) -> IndexingState;

    /// Register for indexing-service property changes
    ///
    /// Fails when the workspace has no indexing service.
    fn subscribe_indexing_changed(
        &self,
        observer: Arc<dyn StateObserver<IndexingChanged>>,
    ) -> Result<Subscription>;

    /// File contexts under `scope` produced by providers of `provider_types`
    ///
    /// `scope` is relative to [`Workspace::location`]; an empty path selects
    /// the whole workspace. Returns [`crate::Error::Cancelled`] when `cancel`
    /// fires before the query finishes.
    async fn query_file_contexts(
        &self,
        scope: &Path,
        provider_types: &[ProviderTypeId],
        cancel: CancellationToken,
    ) -> Result<Vec<FileContextGroup>>;
}

/// One source file's association with the tool that builds it
pub trait FileContext: Send + Sync {
    fn path(&self) -> &Path;

    fn provider_type(&self) -> ProviderTypeId;

    /// The owning project context, if the provider attached one
    fn project_context(&self) -> Option<Arc<dyn ProjectContext>>;

    fn subscribe_changed(
        &self,
        observer: Arc<dyn StateObserver<FileContextChanged>>,
    ) -> Subscription;
}

/// A compilation unit within a workspace
#[async_trait]
pub trait ProjectContext: Send + Sync {
    /// Identity used for deduplication
    fn id(&self) -> ProjectContextId;

    fn name(&self) -> &str;

    async fn intellisense_info(&self) -> Result<IntelliSenseInfo>;
}
