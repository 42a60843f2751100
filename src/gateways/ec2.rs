use async_trait::async_trait;
use aws_sdk_ec2 as ec2;
use aws_sdk_ec2::types::Filter;

use crate::handler_core::{HandlerError, ResourceKind, ResourceRef, Tag, TagGateway};
use crate::reconcile::ReconcilePlan;

/// EC2 tagging is incremental: `CreateTags` adds or overwrites the tags it
/// is given and leaves the rest alone, so only the missing mandatory tags
/// are submitted. The same wire calls cover instances and VPC endpoints;
/// the two gateways differ only in kind and id extraction.
pub struct Ec2TagGateway {
    client: ec2::Client,
}

impl Ec2TagGateway {
    pub fn new(conf: &aws_config::SdkConfig) -> Self {
        Self { client: ec2::Client::new(conf) }
    }
}

#[async_trait]
impl TagGateway for Ec2TagGateway {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Compute
    }

    async fn read_tags(&self, resource: &ResourceRef) -> Result<Vec<Tag>, HandlerError> {
        read_resource_tags(&self.client, &resource.id).await
    }

    async fn write_tags(&self, resource: &ResourceRef, plan: &ReconcilePlan) -> Result<(), HandlerError> {
        create_tags(&self.client, &resource.id, &plan.added).await
    }
}

pub struct VpcEndpointTagGateway {
    client: ec2::Client,
}

impl VpcEndpointTagGateway {
    pub fn new(conf: &aws_config::SdkConfig) -> Self {
        Self { client: ec2::Client::new(conf) }
    }
}

#[async_trait]
impl TagGateway for VpcEndpointTagGateway {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Endpoint
    }

    async fn read_tags(&self, resource: &ResourceRef) -> Result<Vec<Tag>, HandlerError> {
        read_resource_tags(&self.client, &resource.id).await
    }

    async fn write_tags(&self, resource: &ResourceRef, plan: &ReconcilePlan) -> Result<(), HandlerError> {
        create_tags(&self.client, &resource.id, &plan.added).await
    }
}

async fn read_resource_tags(client: &ec2::Client, id: &str) -> Result<Vec<Tag>, HandlerError> {
    let resp = client
        .describe_tags()
        .filters(Filter::builder().name("resource-id").values(id).build())
        .send()
        .await
        .map_err(|e| HandlerError::GatewayRead(e.into()))?;

    let tags = resp
        .tags()
        .iter()
        .filter_map(|t| {
            let key = t.key()?;
            let value = t.value()?;
            Some(Tag::new(key, value))
        })
        .collect();
    Ok(tags)
}

async fn create_tags(client: &ec2::Client, id: &str, added: &[Tag]) -> Result<(), HandlerError> {
    // Nothing missing means nothing to apply; an empty CreateTags call
    // would be rejected anyway.
    if added.is_empty() {
        return Ok(());
    }

    let tags: Vec<ec2::types::Tag> = added
        .iter()
        .map(|t| ec2::types::Tag::builder().key(&t.key).value(&t.value).build())
        .collect();

    client
        .create_tags()
        .resources(id)
        .set_tags(Some(tags))
        .send()
        .await
        .map_err(|e| HandlerError::GatewayWrite(e.into()))?;
    Ok(())
}
