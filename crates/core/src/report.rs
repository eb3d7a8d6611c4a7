//! User-visible notices and the seams that deliver them

use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::error::Result;
use crate::model::ProjectContextId;

/// Body of the notice raised for a project context without command lines
pub const EMPTY_COMMAND_LINES_MESSAGE: &str =
    "IntelliSenseInfoTest: no command-lines in an IIntelliSenseInfo object";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeButtons {
    Ok,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeIcon {
    Information,
}

/// A modal message shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub message: String,
    pub severity: Severity,
    pub buttons: NoticeButtons,
    pub icon: NoticeIcon,
    /// Workspace the validation pass ran against
    pub workspace: PathBuf,
    /// Project context the notice is about
    pub project: Option<ProjectContextId>,
    pub project_name: Option<String>,
}

impl Notice {
    /// Informational notice with an OK button
    pub fn info(message: impl Into<String>, workspace: impl Into<PathBuf>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Info,
            buttons: NoticeButtons::Ok,
            icon: NoticeIcon::Information,
            workspace: workspace.into(),
            project: None,
            project_name: None,
        }
    }

    pub fn for_project(mut self, id: ProjectContextId, name: impl Into<String>) -> Self {
        self.project = Some(id);
        self.project_name = Some(name.into());
        self
    }
}

/// Delivers notices from a background pass to wherever the user sees them
#[async_trait]
pub trait Reporter: Send + Sync {
    /// Resolves once the notice has been presented and acknowledged
    async fn report(&self, notice: Notice) -> Result<()>;
}

/// Presents notices; always called on the main/UI context
pub trait NoticePresenter: Send {
    fn present(&mut self, notice: &Notice);
}

/// Writes notices to the log
#[derive(Debug, Default)]
pub struct LogPresenter;

impl NoticePresenter for LogPresenter {
    fn present(&mut self, notice: &Notice) {
        info!(
            workspace = %notice.workspace.display(),
            project = notice.project_name.as_deref().unwrap_or("<none>"),
            "{}",
            notice.message
        );
    }
}

/// Prints notices to standard output
#[derive(Debug, Default)]
pub struct StdoutPresenter;

impl NoticePresenter for StdoutPresenter {
    fn present(&mut self, notice: &Notice) {
        match &notice.project_name {
            Some(project) => println!("[info] {} ({project})", notice.message),
            None => println!("[info] {}", notice.message),
        }
    }
}

/// Keeps every presented notice; shared handle for inspection
#[derive(Debug, Default, Clone)]
pub struct RecordingPresenter {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|notices| notices.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.notices.lock().map(|n| n.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NoticePresenter for RecordingPresenter {
    fn present(&mut self, notice: &Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice.clone());
        }
    }
}

/// Reporter that records in place, without a main-context hop
#[derive(Debug, Default, Clone)]
pub struct RecordingReporter {
    presenter: RecordingPresenter,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.presenter.notices()
    }

    pub fn len(&self) -> usize {
        self.presenter.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presenter.is_empty()
    }
}

#[async_trait]
impl Reporter for RecordingReporter {
    async fn report(&self, notice: Notice) -> Result<()> {
        let mut presenter = self.presenter.clone();
        presenter.present(&notice);
        Ok(())
    }
}
