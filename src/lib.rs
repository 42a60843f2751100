//! CloudTrail-driven mandatory-tag enforcement. One audit event per
//! invocation; mandatory organizational tags are reconciled onto the
//! affected EC2 instance, DynamoDB table, S3 bucket, EFS file system, or
//! VPC endpoint.

pub mod event;
pub mod gateways;
pub mod handler;
pub mod handler_core;
pub mod identity;
pub mod mock;
pub mod reconcile;

pub use handler::Enforcer;
pub use handler_core::{
    HandlerError, ReconcileMode, ResourceKind, ResourceRef, Response, Tag, TagGateway, TagPolicy,
};
