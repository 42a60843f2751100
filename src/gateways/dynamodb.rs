use async_trait::async_trait;
use aws_sdk_dynamodb as ddb;

use crate::handler_core::{HandlerError, ResourceKind, ResourceRef, Tag, TagGateway};
use crate::reconcile::ReconcilePlan;

/// DynamoDB's `TagResource` upserts the tags it is given; the full
/// reconciled set is submitted so the call also repairs tags removed
/// between read and write.
pub struct DynamoTagGateway {
    client: ddb::Client,
}

impl DynamoTagGateway {
    pub fn new(conf: &aws_config::SdkConfig) -> Self {
        Self { client: ddb::Client::new(conf) }
    }
}

#[async_trait]
impl TagGateway for DynamoTagGateway {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Table
    }

    async fn read_tags(&self, resource: &ResourceRef) -> Result<Vec<Tag>, HandlerError> {
        let resp = self
            .client
            .list_tags_of_resource()
            .resource_arn(&resource.id)
            .send()
            .await
            .map_err(|e| HandlerError::GatewayRead(e.into()))?;

        Ok(resp.tags().iter().map(|t| Tag::new(t.key(), t.value())).collect())
    }

    async fn write_tags(&self, resource: &ResourceRef, plan: &ReconcilePlan) -> Result<(), HandlerError> {
        let tags: Vec<ddb::types::Tag> = plan
            .tags
            .iter()
            .map(|t| {
                ddb::types::Tag::builder()
                    .key(&t.key)
                    .value(&t.value)
                    .build()
                    .map_err(|e| HandlerError::GatewayWrite(e.into()))
            })
            .collect::<Result<_, _>>()?;

        self.client
            .tag_resource()
            .resource_arn(&resource.id)
            .set_tags(Some(tags))
            .send()
            .await
            .map_err(|e| HandlerError::GatewayWrite(e.into()))?;
        Ok(())
    }
}
