//! Data model shared between the host abstraction and the validator
//!
//! Entities here are plain values. Anything with identity or host-side
//! lifetime (workspaces, file contexts, project contexts) lives behind the
//! traits in [`crate::host`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::host::FileContext;

/// Provider type identifier of the native (C/C++) project context provider
pub const NATIVE_PROJECT_CONTEXT_TYPE: ProviderTypeId =
    ProviderTypeId(uuid::uuid!("ED814497-3055-46C1-9FE0-586CC9530310"));

/// Indexing state of a workspace as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexingState {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Failed,
}

impl IndexingState {
    /// Whether indexing has finished successfully
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for IndexingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Set of indexing-service properties that changed in one notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IndexProperties(u8);

impl IndexProperties {
    pub const NONE: Self = Self(0);
    /// The indexing state property
    pub const STATE: Self = Self(1);
    /// Progress counters (files scanned so far)
    pub const PROGRESS: Self = Self(1 << 1);
    /// The total number of files known to the index
    pub const FILE_COUNT: Self = Self(1 << 2);

    /// True if every property in `other` is also in `self`
    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for IndexProperties {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Notification emitted by a workspace's indexing service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexingChanged {
    /// Which properties changed
    pub changed: IndexProperties,
    /// State at the time the notification was raised
    pub state: IndexingState,
}

impl IndexingChanged {
    pub fn new(changed: IndexProperties, state: IndexingState) -> Self {
        Self { changed, state }
    }
}

/// Notification emitted when the active workspace changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceChanged {
    /// Location of the newly active workspace, `None` when a workspace was closed
    pub location: Option<PathBuf>,
}

/// Notification emitted when a file context is updated by its provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContextChanged {
    pub path: PathBuf,
}

/// Identifier of the tool that produced a file context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderTypeId(pub Uuid);

impl ProviderTypeId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ProviderTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Hosts print provider GUIDs upper-case
        write!(f, "{}", self.0.hyphenated().to_string().to_uppercase())
    }
}

impl std::str::FromStr for ProviderTypeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Identity of a project context, unique within one host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectContextId(pub Uuid);

impl ProjectContextId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ProjectContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single compiler invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandLine(pub String);

impl CommandLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Compiler command-line information attached to a project context
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IntelliSenseInfo {
    pub command_lines: Vec<CommandLine>,
}

impl IntelliSenseInfo {
    pub fn new(command_lines: Vec<CommandLine>) -> Self {
        Self { command_lines }
    }

    pub fn command_lines_count(&self) -> usize {
        self.command_lines.len()
    }

    /// A correctly indexed native project has at least one command line
    pub fn is_empty(&self) -> bool {
        self.command_lines.is_empty()
    }
}

/// Key a group of file contexts was produced under
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderKey {
    /// Human readable provider name
    pub name: String,
    /// Provider types this provider can produce
    pub provider_types: Vec<ProviderTypeId>,
}

impl ProviderKey {
    pub fn new(name: impl Into<String>, provider_types: Vec<ProviderTypeId>) -> Self {
        Self {
            name: name.into(),
            provider_types,
        }
    }
}

/// All file contexts a single provider returned for a query
#[derive(Clone)]
pub struct FileContextGroup {
    pub provider: ProviderKey,
    pub contexts: Vec<Arc<dyn FileContext>>,
}

impl FileContextGroup {
    pub fn new(provider: ProviderKey, contexts: Vec<Arc<dyn FileContext>>) -> Self {
        Self { provider, contexts }
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

impl fmt::Debug for FileContextGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileContextGroup")
            .field("provider", &self.provider)
            .field("contexts", &self.contexts.len())
            .finish()
    }
}
