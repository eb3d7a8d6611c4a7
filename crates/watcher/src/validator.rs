//! Project-context validation
//!
//! A pass queries the workspace for file contexts, resolves them to distinct
//! project contexts and reports every project whose IntelliSense info has no
//! compiler command lines. Passes are read-only.

use intellisense_check_core::config::ValidatorConfig;
use intellisense_check_core::error::{Error, Result};
use intellisense_check_core::host::{ProjectContext, Workspace};
use intellisense_check_core::model::{
    FileContextChanged, FileContextGroup, ProjectContextId, ProviderTypeId,
};
use intellisense_check_core::report::{Notice, Reporter, EMPTY_COMMAND_LINES_MESSAGE};
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Which file contexts a pass looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRequest {
    /// Relative to the workspace root; empty selects the whole workspace
    pub scope: PathBuf,
    pub provider_types: Vec<ProviderTypeId>,
}

impl ValidationRequest {
    pub fn whole_workspace(provider_types: Vec<ProviderTypeId>) -> Self {
        Self {
            scope: PathBuf::new(),
            provider_types,
        }
    }

    pub fn from_config(config: &ValidatorConfig) -> Self {
        Self {
            scope: config.scope.clone(),
            provider_types: config.provider_types.clone(),
        }
    }
}

/// A project context whose IntelliSense info has no command lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub project: ProjectContextId,
    pub project_name: String,
}

/// Result of one completed pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub workspace: PathBuf,
    /// Provider groups returned by the query
    pub groups: usize,
    pub file_contexts: usize,
    /// Distinct project contexts checked
    pub project_contexts: usize,
    pub violations: Vec<Violation>,
}

impl ValidationOutcome {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Checks project contexts and reports violations
pub struct ContextValidator {
    reporter: Arc<dyn Reporter>,
}

impl ContextValidator {
    pub fn new(reporter: Arc<dyn Reporter>) -> Self {
        Self { reporter }
    }

    /// Distinct project contexts referenced by `groups`, in first-seen order
    ///
    /// File contexts without a project are skipped. Every file context gets
    /// an inert change listener so incremental revalidation can hook in later.
    pub fn collect_project_contexts(groups: &[FileContextGroup]) -> Vec<Arc<dyn ProjectContext>> {
        let mut seen: HashSet<ProjectContextId> = HashSet::new();
        let mut projects = Vec::new();

        for group in groups {
            for file in &group.contexts {
                // Dropping the handle leaves the listener registered
                let _listener = file.subscribe_changed(Arc::new(|_: &FileContextChanged| {}));

                let Some(project) = file.project_context() else {
                    trace!("No project context for {:?}", file.path());
                    continue;
                };
                if seen.insert(project.id()) {
                    projects.push(project);
                }
            }
        }
        projects
    }

    /// Query and check without reporting
    ///
    /// Returns [`Error::Cancelled`] if `cancel` fires before the pass finishes.
    pub async fn validate(
        &self,
        workspace: &dyn Workspace,
        request: &ValidationRequest,
        cancel: &CancellationToken,
    ) -> Result<ValidationOutcome> {
        let groups = workspace
            .query_file_contexts(&request.scope, &request.provider_types, cancel.clone())
            .await?;

        let file_contexts = groups.iter().map(FileContextGroup::len).sum();
        let projects = Self::collect_project_contexts(&groups);
        debug!(
            "Checking {} project contexts from {} file contexts in {:?}",
            projects.len(),
            file_contexts,
            workspace.location()
        );

        let mut violations = Vec::new();
        for project in &projects {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let info = match project.intellisense_info().await {
                Ok(info) => info,
                Err(e) => {
                    warn!(
                        "Failed to get IntelliSense info for {}: {}",
                        project.name(),
                        e
                    );
                    continue;
                }
            };

            if info.command_lines_count() == 0 {
                violations.push(Violation {
                    project: project.id(),
                    project_name: project.name().to_string(),
                });
            }
        }

        Ok(ValidationOutcome {
            workspace: workspace.location().to_path_buf(),
            groups: groups.len(),
            file_contexts,
            project_contexts: projects.len(),
            violations,
        })
    }

    /// Validate and raise one notice per violation
    ///
    /// Never fails: cancellation abandons the pass silently and host errors
    /// are logged. Returns `None` when the pass did not complete.
    pub async fn run_pass(
        &self,
        workspace: Arc<dyn Workspace>,
        request: &ValidationRequest,
        cancel: CancellationToken,
    ) -> Option<ValidationOutcome> {
        let location = workspace.location().to_path_buf();

        let outcome = match self.validate(workspace.as_ref(), request, &cancel).await {
            Ok(outcome) => outcome,
            Err(Error::Cancelled) => {
                debug!("Validation pass for {:?} cancelled", location);
                return None;
            }
            Err(e) => {
                warn!("Validation pass for {:?} failed: {}", location, e);
                return None;
            }
        };

        for violation in &outcome.violations {
            if cancel.is_cancelled() {
                debug!("Validation pass for {:?} cancelled while reporting", location);
                return None;
            }

            let notice = Notice::info(EMPTY_COMMAND_LINES_MESSAGE, location.clone())
                .for_project(violation.project, violation.project_name.clone());
            if let Err(e) = self.reporter.report(notice).await {
                warn!(
                    "Failed to report violation for {}: {}",
                    violation.project_name, e
                );
            }
        }

        info!(
            "Validated {} project contexts in {:?}: {} without command lines",
            outcome.project_contexts,
            location,
            outcome.violations.len()
        );
        Some(outcome)
    }
}
