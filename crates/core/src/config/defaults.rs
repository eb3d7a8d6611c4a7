//! Default values and functions for configuration

use std::path::PathBuf;

use crate::model::{ProviderTypeId, NATIVE_PROJECT_CONTEXT_TYPE};

pub(crate) const ENV_PREFIX: &str = "INTELLISENSE_CHECK";

pub(crate) fn default_provider_types() -> Vec<ProviderTypeId> {
    vec![NATIVE_PROJECT_CONTEXT_TYPE]
}

pub(crate) fn default_scope() -> PathBuf {
    PathBuf::new()
}

pub(crate) fn default_dispose_previous_watcher() -> bool {
    false
}

pub(crate) fn default_cancel_in_flight() -> bool {
    false
}

pub(crate) fn default_notice_queue_size() -> usize {
    64
}
