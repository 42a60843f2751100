use async_trait::async_trait;
use aws_sdk_efs as efs;

use crate::handler_core::{HandlerError, ResourceKind, ResourceRef, Tag, TagGateway};
use crate::reconcile::ReconcilePlan;

/// EFS `TagResource` upserts like DynamoDB's; the full reconciled set is
/// submitted.
pub struct EfsTagGateway {
    client: efs::Client,
}

impl EfsTagGateway {
    pub fn new(conf: &aws_config::SdkConfig) -> Self {
        Self { client: efs::Client::new(conf) }
    }
}

#[async_trait]
impl TagGateway for EfsTagGateway {
    fn kind(&self) -> ResourceKind {
        ResourceKind::FileSystem
    }

    async fn read_tags(&self, resource: &ResourceRef) -> Result<Vec<Tag>, HandlerError> {
        let resp = self
            .client
            .describe_tags()
            .file_system_id(&resource.id)
            .send()
            .await
            .map_err(|e| HandlerError::GatewayRead(e.into()))?;

        Ok(resp.tags().iter().map(|t| Tag::new(t.key(), t.value())).collect())
    }

    async fn write_tags(&self, resource: &ResourceRef, plan: &ReconcilePlan) -> Result<(), HandlerError> {
        let tags: Vec<efs::types::Tag> = plan
            .tags
            .iter()
            .map(|t| {
                efs::types::Tag::builder()
                    .key(&t.key)
                    .value(&t.value)
                    .build()
                    .map_err(|e| HandlerError::GatewayWrite(e.into()))
            })
            .collect::<Result<_, _>>()?;

        self.client
            .tag_resource()
            .resource_id(&resource.id)
            .set_tags(Some(tags))
            .send()
            .await
            .map_err(|e| HandlerError::GatewayWrite(e.into()))?;
        Ok(())
    }
}
