use std::sync::Arc;
use tracing::debug;

use crate::error::{Result, require_non_empty};
use crate::scope::{ResourceHandle, ResourceScope};

/// Two-tier resource lookup.
///
/// A context scope, when present, is the effective scope for every lookup;
/// otherwise the locator's own defining scope is used. Only the effective
/// scope is consulted, so a resource visible only through the defining scope
/// is reported as absent while a context scope is set. Callers that switch
/// context scopes per call may therefore observe different results for the
/// same name.
#[derive(Debug, Clone)]
pub struct ResourceLocator {
    defining: Arc<dyn ResourceScope>,
    context: Option<Arc<dyn ResourceScope>>,
}

impl ResourceLocator {
    pub fn new(defining: Arc<dyn ResourceScope>) -> Self {
        Self {
            defining,
            context: None,
        }
    }

    pub fn with_context(mut self, context: Option<Arc<dyn ResourceScope>>) -> Self {
        self.context = context;
        self
    }

    pub fn effective_scope(&self) -> Arc<dyn ResourceScope> {
        Arc::clone(self.context.as_ref().unwrap_or(&self.defining))
    }

    /// `Ok(None)` when the effective scope has no such resource.
    pub fn get_resource(&self, name: &str) -> Result<Option<ResourceHandle>> {
        require_non_empty(name, "name")?;
        let handle = self.effective_scope().open_resource(name)?;
        if handle.is_none() {
            debug!(resource = name, "resource not found");
        }
        Ok(handle)
    }
}
