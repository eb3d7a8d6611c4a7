//! TOML fixtures describing workspaces for the in-memory host
//!
//! ```toml
//! [[workspaces]]
//! name = "engine"
//! location = "/src/engine"
//!
//! [[workspaces.projects]]
//! name = "renderer"
//! command_lines = ["cl.exe /c renderer.cpp"]
//!
//! [[workspaces.files]]
//! path = "renderer/renderer.cpp"
//! project = "renderer"
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result, ResultExt};
use crate::memory::{MemoryFileContext, MemoryHost, MemoryProjectContext, MemoryWorkspace};
use crate::model::{CommandLine, ProviderTypeId, NATIVE_PROJECT_CONTEXT_TYPE};

fn default_provider_name() -> String {
    "native".to_string()
}

fn default_provider_type() -> ProviderTypeId {
    NATIVE_PROJECT_CONTEXT_TYPE
}

#[derive(Debug, Clone, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub workspaces: Vec<WorkspaceFixture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceFixture {
    pub name: String,
    pub location: PathBuf,
    /// Artificial latency for file-context queries
    #[serde(default)]
    pub query_delay_ms: Option<u64>,
    #[serde(default)]
    pub projects: Vec<ProjectFixture>,
    #[serde(default)]
    pub files: Vec<FileFixture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectFixture {
    pub name: String,
    #[serde(default)]
    pub command_lines: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileFixture {
    /// Relative to the workspace location unless absolute
    pub path: PathBuf,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default = "default_provider_name")]
    pub provider: String,
    #[serde(default = "default_provider_type")]
    pub provider_type: ProviderTypeId,
}

/// Host built from a fixture, plus handles to drive its workspaces
pub struct LoadedFixture {
    pub host: MemoryHost,
    pub workspaces: Vec<LoadedWorkspace>,
}

pub struct LoadedWorkspace {
    pub name: String,
    pub workspace: Arc<MemoryWorkspace>,
    pub projects: Vec<Arc<MemoryProjectContext>>,
}

impl LoadedFixture {
    pub fn workspace(&self, name: &str) -> Option<&LoadedWorkspace> {
        self.workspaces.iter().find(|ws| ws.name == name)
    }
}

impl Fixture {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::fixture(format!("Invalid fixture: {e}")))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read fixture {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Build an in-memory host holding every workspace of the fixture
    ///
    /// No workspace is activated; callers decide when to switch.
    pub fn load(&self) -> Result<LoadedFixture> {
        let mut workspaces = Vec::with_capacity(self.workspaces.len());
        for fixture in &self.workspaces {
            workspaces.push(fixture.build()?);
        }
        Ok(LoadedFixture {
            host: MemoryHost::new(),
            workspaces,
        })
    }
}

impl WorkspaceFixture {
    fn build(&self) -> Result<LoadedWorkspace> {
        let mut workspace = MemoryWorkspace::new(&self.location);
        if let Some(ms) = self.query_delay_ms {
            workspace = workspace.with_query_delay(Duration::from_millis(ms));
        }

        let mut by_name: HashMap<&str, Arc<MemoryProjectContext>> = HashMap::new();
        let mut projects = Vec::with_capacity(self.projects.len());
        for project in &self.projects {
            let context = Arc::new(MemoryProjectContext::new(
                project.name.clone(),
                project
                    .command_lines
                    .iter()
                    .map(|line| CommandLine::new(line.clone()))
                    .collect(),
            ));
            if by_name
                .insert(project.name.as_str(), Arc::clone(&context))
                .is_some()
            {
                return Err(Error::fixture(format!(
                    "Duplicate project '{}' in workspace '{}'",
                    project.name, self.name
                )));
            }
            projects.push(context);
        }

        for file in &self.files {
            let path = if file.path.is_absolute() {
                file.path.clone()
            } else {
                self.location.join(&file.path)
            };
            let mut context =
                MemoryFileContext::new(path, file.provider.clone(), file.provider_type);
            if let Some(project) = &file.project {
                let project = by_name.get(project.as_str()).ok_or_else(|| {
                    Error::fixture(format!(
                        "File {} references unknown project '{}' in workspace '{}'",
                        file.path.display(),
                        project,
                        self.name
                    ))
                })?;
                context = context.with_project(Arc::clone(project));
            }
            workspace.add_file(context);
        }

        Ok(LoadedWorkspace {
            name: self.name.clone(),
            workspace: Arc::new(workspace),
            projects,
        })
    }
}
