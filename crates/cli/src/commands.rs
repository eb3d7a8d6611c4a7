//! `run` and `check` against a fixture host

use anyhow::{anyhow, Context, Result};
use intellisense_check_core::config::Config;
use intellisense_check_core::fixture::{Fixture, LoadedWorkspace};
use intellisense_check_core::host::Workspace;
use intellisense_check_core::model::IndexingState;
use intellisense_check_core::report::{Notice, NoticePresenter};
use intellisense_check_watcher::{
    main_thread_channel, ContextValidator, ValidationOutcome, ValidationRequest,
    WorkspaceSubscriber,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Passes that ran against one fixture workspace
#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceRun {
    pub name: String,
    pub location: PathBuf,
    pub outcomes: Vec<ValidationOutcome>,
}

impl WorkspaceRun {
    pub fn violation_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.violations.len()).sum()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub workspaces: Vec<WorkspaceRun>,
    /// Filled in by callers that record presented notices
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<Notice>,
}

impl RunSummary {
    pub fn violation_count(&self) -> usize {
        self.workspaces.iter().map(WorkspaceRun::violation_count).sum()
    }

    pub fn pass_count(&self) -> usize {
        self.workspaces.iter().map(|ws| ws.outcomes.len()).sum()
    }
}

/// Drive every fixture workspace through a full indexing run
///
/// The watcher is installed on the fixture host and each workspace is
/// activated in turn and taken from `NotStarted` through `Completed`. Notices
/// are presented on the calling task, which plays the part of the main
/// thread. Returns the presenter so callers can inspect what was shown.
pub async fn run_fixture<P>(fixture: &Fixture, config: &Config, presenter: P) -> Result<(RunSummary, P)>
where
    P: NoticePresenter,
{
    let loaded = fixture.load().context("Failed to load fixture")?;
    let service = loaded
        .host
        .service()
        .ok_or_else(|| anyhow!("Fixture host has no workspace service"))?;

    let (reporter, dispatcher) =
        main_thread_channel(config.watcher.notice_queue_size, presenter);
    let subscriber = WorkspaceSubscriber::install(&loaded.host, Arc::new(reporter), config)
        .ok_or_else(|| anyhow!("Workspace validator could not be installed"))?;

    let shutdown = CancellationToken::new();
    let drive = async {
        let mut summary = RunSummary::default();
        for loaded_ws in &loaded.workspaces {
            info!("Activating workspace '{}'", loaded_ws.name);
            service.activate(Some(Arc::clone(&loaded_ws.workspace)));

            for state in [
                IndexingState::NotStarted,
                IndexingState::InProgress,
                IndexingState::Completed,
            ] {
                debug!("Indexing of '{}' is now {}", loaded_ws.name, state);
                loaded_ws.workspace.set_indexing_state(state);
            }

            summary.workspaces.push(WorkspaceRun {
                name: loaded_ws.name.clone(),
                location: loaded_ws.workspace.location().to_path_buf(),
                outcomes: subscriber.wait_idle().await,
            });
        }

        subscriber.shutdown();
        shutdown.cancel();
        summary
    };

    let (summary, presenter) = tokio::join!(drive, dispatcher.run_until(shutdown.clone()));
    Ok((summary, presenter))
}

/// Run one validation pass per selected workspace, without the watcher
///
/// Passes go through the same reporter hop as `run`, so violations reach
/// `presenter` on the calling task.
pub async fn check_fixture<P>(
    fixture: &Fixture,
    config: &Config,
    workspace: Option<&str>,
    presenter: P,
) -> Result<(RunSummary, P)>
where
    P: NoticePresenter,
{
    let loaded = fixture.load().context("Failed to load fixture")?;
    let selected: Vec<&LoadedWorkspace> = match workspace {
        Some(name) => vec![loaded
            .workspace(name)
            .ok_or_else(|| anyhow!("Fixture has no workspace named '{name}'"))?],
        None => loaded.workspaces.iter().collect(),
    };

    let (reporter, dispatcher) =
        main_thread_channel(config.watcher.notice_queue_size, presenter);
    let validator = ContextValidator::new(Arc::new(reporter));
    let request = ValidationRequest::from_config(&config.validator);

    let shutdown = CancellationToken::new();
    let drive = async {
        let mut summary = RunSummary::default();
        for loaded_ws in selected {
            let workspace: Arc<dyn Workspace> = loaded_ws.workspace.clone();
            let outcome = validator
                .run_pass(workspace, &request, shutdown.child_token())
                .await
                .ok_or_else(|| {
                    anyhow!("Validation of workspace '{}' did not complete", loaded_ws.name)
                })?;

            summary.workspaces.push(WorkspaceRun {
                name: loaded_ws.name.clone(),
                location: loaded_ws.workspace.location().to_path_buf(),
                outcomes: vec![outcome],
            });
        }
        Ok::<_, anyhow::Error>(summary)
    };

    let (summary, presenter) = tokio::join!(
        async {
            let summary = drive.await;
            shutdown.cancel();
            summary
        },
        dispatcher.run_until(shutdown.clone())
    );
    Ok((summary?, presenter))
}
