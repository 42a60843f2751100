use serde_json::Value;

use crate::event::Envelope;
use crate::handler_core::{HandlerError, ResourceKind, ResourceRef};

/// Pulls the externally-addressable resource id out of a normalized event.
/// Field paths follow the CloudTrail record shape of each service's API.
pub fn extract(kind: ResourceKind, envelope: &Envelope) -> Result<ResourceRef, HandlerError> {
    let id = match kind {
        // Only the first entry of a tag batch is honored; multi-resource
        // CreateTags calls are not fully handled.
        ResourceKind::Compute => envelope
            .request_parameters
            .pointer("/resourcesSet/items/0/resourceId")
            .and_then(Value::as_str)
            .ok_or_else(|| missing("Resource ID not found in the event"))?,
        ResourceKind::Table => match envelope.name.as_str() {
            "CreateTable" => envelope
                .response_elements
                .pointer("/tableDescription/tableArn")
                .and_then(Value::as_str)
                .ok_or_else(|| missing("ResourceArn not found in the event"))?,
            _ => envelope
                .request_parameters
                .get("resourceArn")
                .and_then(Value::as_str)
                .ok_or_else(|| missing("ResourceArn not found in the event"))?,
        },
        ResourceKind::Bucket => envelope
            .request_parameters
            .get("bucketName")
            .and_then(Value::as_str)
            .ok_or_else(|| missing("Bucket name not found in the event"))?,
        ResourceKind::FileSystem => match envelope.name.as_str() {
            "CreateMountTarget" => envelope
                .response_elements
                .get("fileSystemId")
                .and_then(Value::as_str)
                .ok_or_else(|| missing("ResourceId not found in the event"))?,
            _ => envelope
                .request_parameters
                .get("resourceId")
                .and_then(Value::as_str)
                .ok_or_else(|| missing("ResourceId not found in the event"))?,
        },
        // Endpoint ids only exist in the creation response.
        ResourceKind::Endpoint => envelope
            .response_elements
            .pointer("/CreateVpcEndpointResponse/vpcEndpoint/vpcEndpointId")
            .and_then(Value::as_str)
            .ok_or_else(|| missing("VPC endpoint ID not found in the event"))?,
    };
    Ok(ResourceRef { kind, id: id.to_string() })
}

fn missing(body: &str) -> HandlerError {
    HandlerError::MissingResourceIdentity(body.to_string())
}
