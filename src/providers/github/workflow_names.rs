use std::collections::HashMap;

use log::debug;

use crate::error::Result;

use super::client::CiApi;

/// Workflow id to display name, filled lazily during one report build.
#[derive(Debug, Default)]
pub struct WorkflowNameCache {
    names: HashMap<u64, String>,
}

impl WorkflowNameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the workflow's display name, asking the API only on a miss.
    pub async fn resolve<C: CiApi>(&mut self, client: &C, workflow_id: u64) -> Result<String> {
        if let Some(name) = self.names.get(&workflow_id) {
            debug!("Workflow name cache hit for {workflow_id}");
            return Ok(name.clone());
        }

        debug!("Workflow name cache miss for {workflow_id}");
        let workflow = client.get_workflow(workflow_id).await?;
        debug!("Workflow {} is named {:?}", workflow.id, workflow.name);
        self.names.insert(workflow_id, workflow.name.clone());
        Ok(workflow.name)
    }

    pub(super) fn len(&self) -> usize {
        self.names.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CiHealthError;
    use crate::providers::github::tests::FakeApi;

    #[tokio::test]
    async fn test_resolve_hits_api_once_per_id() {
        let api = FakeApi::default()
            .with_workflow(7, "Integration tests")
            .with_workflow(8, "Static checks");
        let mut cache = WorkflowNameCache::new();

        assert_eq!(cache.resolve(&api, 7).await.unwrap(), "Integration tests");
        assert_eq!(cache.resolve(&api, 7).await.unwrap(), "Integration tests");
        assert_eq!(cache.resolve(&api, 8).await.unwrap(), "Static checks");

        assert_eq!(api.workflow_lookups(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_propagates_lookup_failure() {
        let api = FakeApi::default();
        let mut cache = WorkflowNameCache::new();

        let err = cache.resolve(&api, 99).await.unwrap_err();
        assert!(matches!(err, CiHealthError::NotFound(_)));
        assert_eq!(cache.len(), 0);
    }
}
