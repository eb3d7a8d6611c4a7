#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

//! Workspace-indexing watcher that validates IntelliSense info
//!
//! This crate wires three pieces together:
//! - [`WorkspaceSubscriber`] follows the host's active workspace
//! - [`IndexWatcher`] waits for indexing of that workspace to complete
//! - [`ContextValidator`] checks every project context for compiler
//!   command lines and reports the ones that have none
//!
//! # Example
//!
//! ```no_run
//! use intellisense_check_core::memory::MemoryHost;
//! use intellisense_check_core::report::LogPresenter;
//! use intellisense_check_core::Config;
//! use intellisense_check_watcher::{main_thread_channel, WorkspaceSubscriber};
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let config = Config::default();
//! let host = MemoryHost::new();
//! let (reporter, dispatcher) =
//!     main_thread_channel(config.watcher.notice_queue_size, LogPresenter);
//!
//! let subscriber = WorkspaceSubscriber::install(&host, Arc::new(reporter), &config);
//!
//! // Present notices on this task until every reporter is gone
//! dispatcher.run().await;
//! # drop(subscriber);
//! # }
//! ```

mod dispatch;
mod index_watcher;
mod subscriber;
mod validator;

pub use dispatch::{main_thread_channel, MainThreadDispatcher, MainThreadReporter};
pub use index_watcher::IndexWatcher;
pub use subscriber::WorkspaceSubscriber;
pub use validator::{ContextValidator, ValidationOutcome, ValidationRequest, Violation};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::subscriber::WorkspaceSubscriber;
    pub use crate::validator::{ContextValidator, ValidationOutcome, ValidationRequest};
}
