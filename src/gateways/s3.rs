use async_trait::async_trait;
use aws_sdk_s3 as s3;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::types::Tagging;

use crate::handler_core::{HandlerError, ResourceKind, ResourceRef, Tag, TagGateway};
use crate::reconcile::ReconcilePlan;

/// S3 bucket tagging is whole-set replace: `PutBucketTagging` overwrites
/// everything, so the full reconciled set goes on the wire every time.
pub struct S3TagGateway {
    client: s3::Client,
}

impl S3TagGateway {
    pub fn new(conf: &aws_config::SdkConfig) -> Self {
        Self { client: s3::Client::new(conf) }
    }
}

#[async_trait]
impl TagGateway for S3TagGateway {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Bucket
    }

    async fn read_tags(&self, resource: &ResourceRef) -> Result<Vec<Tag>, HandlerError> {
        let resp = self
            .client
            .get_bucket_tagging()
            .bucket(&resource.id)
            .send()
            .await;

        match resp {
            Ok(out) => Ok(out
                .tag_set()
                .iter()
                .map(|t| Tag::new(t.key(), t.value()))
                .collect()),
            // A bucket with no tags answers NoSuchTagSet; that is an empty
            // current set, not a failure.
            Err(err) if err.code() == Some("NoSuchTagSet") => Ok(vec![]),
            Err(err) => Err(HandlerError::GatewayRead(err.into())),
        }
    }

    async fn write_tags(&self, resource: &ResourceRef, plan: &ReconcilePlan) -> Result<(), HandlerError> {
        let tag_set: Vec<s3::types::Tag> = plan
            .tags
            .iter()
            .map(|t| {
                s3::types::Tag::builder()
                    .key(&t.key)
                    .value(&t.value)
                    .build()
                    .map_err(|e| HandlerError::GatewayWrite(e.into()))
            })
            .collect::<Result<_, _>>()?;

        let tagging = Tagging::builder()
            .set_tag_set(Some(tag_set))
            .build()
            .map_err(|e| HandlerError::GatewayWrite(e.into()))?;

        self.client
            .put_bucket_tagging()
            .bucket(&resource.id)
            .tagging(tagging)
            .send()
            .await
            .map_err(|e| HandlerError::GatewayWrite(e.into()))?;
        Ok(())
    }
}
