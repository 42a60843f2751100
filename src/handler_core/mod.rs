use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::event::Envelope;
use crate::reconcile::ReconcilePlan;

/// One key/value pair attached to a resource. Keys are unique within a
/// resource's tag set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: value.into() }
    }
}

/// Governed resource families, one per AWS tagging API we adapt to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceKind {
    Compute,
    Table,
    Bucket,
    FileSystem,
    Endpoint,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceKind::Compute => "EC2 instance",
            ResourceKind::Table => "DynamoDB table",
            ResourceKind::Bucket => "S3 bucket",
            ResourceKind::FileSystem => "EFS file system",
            ResourceKind::Endpoint => "VPC endpoint",
        };
        f.write_str(s)
    }
}

/// Externally-addressable identity of one resource, derived per event and
/// never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub id: String,
}

/// How the reconciler treats the current tag set for a given event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileMode {
    /// Add missing mandatory tags, keep everything else as-is.
    GapFill,
    /// The event was an explicit tag removal: rewrite the mandatory set
    /// as if the resource had no tags at all.
    ForceReapply,
}

impl ResourceKind {
    /// Maps a CloudTrail (eventSource, eventName) pair onto the resource
    /// kind and reconciliation mode that handle it. Creation events tag the
    /// new resource the same way a tagging event would.
    pub fn classify(source: &str, name: &str) -> Result<(ResourceKind, ReconcileMode), HandlerError> {
        use ReconcileMode::*;
        use ResourceKind::*;
        let pair = match source {
            "ec2.amazonaws.com" => match name {
                "CreateTags" => (Compute, GapFill),
                "DeleteTags" => (Compute, ForceReapply),
                "CreateVpcEndpoint" => (Endpoint, GapFill),
                _ => return Err(HandlerError::unsupported_event(name)),
            },
            "dynamodb.amazonaws.com" => match name {
                "TagResource" | "CreateTable" => (Table, GapFill),
                "UntagResource" => (Table, ForceReapply),
                _ => return Err(HandlerError::unsupported_event(name)),
            },
            "s3.amazonaws.com" => match name {
                "PutBucketTagging" | "CreateBucket" => (Bucket, GapFill),
                "DeleteBucketTagging" => (Bucket, ForceReapply),
                _ => return Err(HandlerError::unsupported_event(name)),
            },
            "elasticfilesystem.amazonaws.com" => match name {
                "TagResource" | "CreateMountTarget" => (FileSystem, GapFill),
                "UntagResource" => (FileSystem, ForceReapply),
                _ => return Err(HandlerError::unsupported_event(name)),
            },
            _ => {
                return Err(HandlerError::UnsupportedEventKind(format!(
                    "Unsupported event source: {source}"
                )))
            }
        };
        Ok(pair)
    }
}

/// Who performed the audited action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorIdentity {
    pub kind: ActorKind,
    pub principal_arn: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorKind {
    User,
    AssumedRole,
    Root,
    Service,
    Other,
}

/// Immutable process-wide enforcement configuration: the mandatory tag set,
/// the provider-reserved key prefix, and the marker identifying our own
/// execution role in principal ARNs.
#[derive(Debug, Clone)]
pub struct TagPolicy {
    pub mandatory: Vec<Tag>,
    pub reserved_prefix: String,
    pub own_role_marker: String,
}

/// Event names our own corrective writes show up under in CloudTrail.
const OWN_APPLY_ACTIONS: [&str; 3] = ["CreateTags", "TagResource", "PutBucketTagging"];

impl Default for TagPolicy {
    fn default() -> Self {
        Self {
            mandatory: vec![Tag::new("Division", "CD"), Tag::new("Studio", "Ajax")],
            reserved_prefix: "aws:".into(),
            own_role_marker: "autotag".into(),
        }
    }
}

impl TagPolicy {
    /// True when the event was produced by this system's own tag-apply call.
    /// Heuristic on caller identity: our writes run under an assumed role
    /// whose ARN carries the role marker, and only ever use the apply
    /// actions. Without this check, every corrective write re-triggers the
    /// handler through the event it audits.
    pub fn is_self_triggered(&self, actor: &ActorIdentity, event_name: &str) -> bool {
        actor.kind == ActorKind::AssumedRole
            && actor.principal_arn.contains(&self.own_role_marker)
            && OWN_APPLY_ACTIONS.contains(&event_name)
    }
}

/// Response returned for every invocation, success or failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status_code: u16,
    pub body: String,
}

impl Response {
    pub fn ok(body: impl Into<String>) -> Self {
        Self { status_code: 200, body: body.into() }
    }
}

impl From<&HandlerError> for Response {
    fn from(err: &HandlerError) -> Self {
        Self { status_code: err.status_code(), body: err.to_string() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The event envelope is missing a field we cannot proceed without.
    #[error("{0}")]
    MalformedEvent(String),
    /// The resource id could not be extracted from the event.
    #[error("{0}")]
    MissingResourceIdentity(String),
    /// Source/name pair outside the governed set.
    #[error("{0}")]
    UnsupportedEventKind(String),
    /// Reading current tags from AWS failed.
    #[error("Error fetching tags: {0}")]
    GatewayRead(anyhow::Error),
    /// Writing reconciled tags to AWS failed.
    #[error("Error applying tags: {0}")]
    GatewayWrite(anyhow::Error),
}

impl HandlerError {
    fn unsupported_event(name: &str) -> Self {
        HandlerError::UnsupportedEventKind(format!("Unsupported event: {name}"))
    }

    /// Client errors are 400 and never retried; gateway failures are 500.
    pub fn status_code(&self) -> u16 {
        match self {
            HandlerError::MalformedEvent(_)
            | HandlerError::MissingResourceIdentity(_)
            | HandlerError::UnsupportedEventKind(_) => 400,
            HandlerError::GatewayRead(_) | HandlerError::GatewayWrite(_) => 500,
        }
    }
}

/// Narrow per-kind contract the reconciler depends on. Each AWS adapter
/// implements this once; everything provider-specific stays behind it.
#[async_trait]
pub trait TagGateway: Send + Sync {
    fn kind(&self) -> ResourceKind;

    fn extract_id(&self, envelope: &Envelope) -> Result<ResourceRef, HandlerError> {
        crate::identity::extract(self.kind(), envelope)
    }

    /// Current tags on the resource. "No tag set exists yet" is an empty
    /// result, not an error.
    async fn read_tags(&self, resource: &ResourceRef) -> Result<Vec<Tag>, HandlerError>;

    /// Submit the reconciled tags. Whole-set-replace APIs take
    /// `plan.tags`; incremental APIs may submit only `plan.added`.
    async fn write_tags(&self, resource: &ResourceRef, plan: &ReconcilePlan) -> Result<(), HandlerError>;
}
