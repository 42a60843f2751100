//! In-memory gateway for MOCK_MODE runs and tests. No AWS calls; tags live
//! in a map keyed by resource id.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::handler_core::{HandlerError, ResourceKind, ResourceRef, Tag, TagGateway};
use crate::reconcile::ReconcilePlan;

pub struct MemoryTagGateway {
    kind: ResourceKind,
    store: Mutex<HashMap<String, Vec<Tag>>>,
    writes: Mutex<Vec<(String, Vec<Tag>)>>,
}

impl MemoryTagGateway {
    pub fn new(kind: ResourceKind) -> Self {
        Self { kind, store: Mutex::new(HashMap::new()), writes: Mutex::new(Vec::new()) }
    }

    /// Pre-seed a resource's tag set.
    pub fn seed(&self, id: &str, tags: Vec<Tag>) {
        self.store.lock().unwrap().insert(id.to_string(), tags);
    }

    pub fn tags_of(&self, id: &str) -> Vec<Tag> {
        self.store.lock().unwrap().get(id).cloned().unwrap_or_default()
    }

    /// Every tag set submitted through `write_tags`, in order.
    pub fn writes(&self) -> Vec<(String, Vec<Tag>)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }
}

#[async_trait]
impl TagGateway for MemoryTagGateway {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    async fn read_tags(&self, resource: &ResourceRef) -> Result<Vec<Tag>, HandlerError> {
        // Unknown resource behaves like "no tag set yet".
        Ok(self.tags_of(&resource.id))
    }

    async fn write_tags(&self, resource: &ResourceRef, plan: &ReconcilePlan) -> Result<(), HandlerError> {
        // Submit what the real adapter for this kind would: incremental
        // EC2-backed kinds send only the appended tags, the rest replace
        // or upsert the full set.
        let submitted = match self.kind {
            ResourceKind::Compute | ResourceKind::Endpoint => {
                if plan.added.is_empty() {
                    return Ok(());
                }
                plan.added.clone()
            }
            _ => plan.tags.clone(),
        };

        let mut store = self.store.lock().unwrap();
        let current = store.entry(resource.id.clone()).or_default();
        if self.kind == ResourceKind::Bucket {
            *current = submitted.clone();
        } else {
            for tag in &submitted {
                match current.iter_mut().find(|t| t.key == tag.key) {
                    Some(existing) => existing.value = tag.value.clone(),
                    None => current.push(tag.clone()),
                }
            }
        }
        drop(store);

        self.writes.lock().unwrap().push((resource.id.clone(), submitted));
        Ok(())
    }
}

/// One in-memory gateway per governed kind, mirroring the AWS set.
pub fn build_gateways() -> Vec<Arc<dyn TagGateway>> {
    [
        ResourceKind::Compute,
        ResourceKind::Endpoint,
        ResourceKind::Table,
        ResourceKind::Bucket,
        ResourceKind::FileSystem,
    ]
    .into_iter()
    .map(|kind| Arc::new(MemoryTagGateway::new(kind)) as Arc<dyn TagGateway>)
    .collect()
}
