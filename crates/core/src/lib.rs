#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

//! Core types and traits for the IntelliSense-info workspace validator
//!
//! This crate provides the foundational abstractions used by the watcher and
//! the command-line harness:
//!
//! - **Host**: traits for the capabilities a host environment exposes
//!   (workspace service, workspaces, file and project contexts)
//! - **Observers**: callback registration with explicit unsubscribe
//! - **Model**: indexing states, provider identifiers, IntelliSense info
//! - **Reports**: user-visible notices and the presenters that show them
//! - **Configuration** and **error handling**
//! - **Memory host** and **fixtures** for running without a real host

pub mod config;
pub mod error;
pub mod fixture;
pub mod host;
pub mod memory;
pub mod model;
pub mod observer;
pub mod report;

// Re-export main types for convenience
pub use config::{Config, ValidatorConfig, WatcherConfig};
pub use error::{Error, Result, ResultExt};
pub use host::{FileContext, ProjectContext, Workspace, WorkspaceHost, WorkspaceService};
pub use model::{
    CommandLine, FileContextChanged, FileContextGroup, IndexProperties, IndexingChanged,
    IndexingState, IntelliSenseInfo, ProjectContextId, ProviderKey, ProviderTypeId,
    WorkspaceChanged, NATIVE_PROJECT_CONTEXT_TYPE,
};
pub use observer::{ObserverList, StateObserver, Subscription};
pub use report::{Notice, NoticePresenter, Reporter, EMPTY_COMMAND_LINES_MESSAGE};

/// Version of the core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Result, ResultExt};
    pub use crate::host::{FileContext, ProjectContext, Workspace, WorkspaceHost};
    pub use crate::model::IndexingState;
}
