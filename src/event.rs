use serde_json::Value;

use crate::handler_core::{ActorIdentity, ActorKind, HandlerError};

/// Canonical view of one audit event. CloudTrail delivers the same record
/// either flat (direct invocation) or wrapped under `detail` (EventBridge);
/// normalization hides the difference from everything downstream.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub source: String,
    pub name: String,
    pub actor: ActorIdentity,
    pub request_parameters: Value,
    pub response_elements: Value,
}

impl Envelope {
    pub fn normalize(raw: &Value) -> Result<Envelope, HandlerError> {
        let detail = raw.get("detail").unwrap_or(raw);

        let source = detail
            .get("eventSource")
            .and_then(Value::as_str)
            .ok_or_else(|| HandlerError::MalformedEvent("Event source not found".into()))?
            .to_string();

        let name = detail
            .get("eventName")
            .and_then(Value::as_str)
            .ok_or_else(|| HandlerError::MalformedEvent("Event name not found".into()))?
            .to_string();

        let identity = detail.get("userIdentity");
        let actor = ActorIdentity {
            kind: identity
                .and_then(|u| u.get("type"))
                .and_then(Value::as_str)
                .map(actor_kind)
                .unwrap_or(ActorKind::Other),
            principal_arn: identity
                .and_then(|u| u.get("arn"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        };

        Ok(Envelope {
            source,
            name,
            actor,
            request_parameters: detail.get("requestParameters").cloned().unwrap_or(Value::Null),
            response_elements: detail.get("responseElements").cloned().unwrap_or(Value::Null),
        })
    }
}

fn actor_kind(identity_type: &str) -> ActorKind {
    match identity_type {
        "IAMUser" => ActorKind::User,
        "AssumedRole" => ActorKind::AssumedRole,
        "Root" => ActorKind::Root,
        "AWSService" => ActorKind::Service,
        _ => ActorKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_flat_event() {
        let raw = json!({
            "eventSource": "s3.amazonaws.com",
            "eventName": "PutBucketTagging",
            "userIdentity": {"type": "Root", "arn": "arn:aws:iam::361769560345:root"},
            "requestParameters": {"bucketName": "b1"}
        });
        let env = Envelope::normalize(&raw).unwrap();
        assert_eq!(env.source, "s3.amazonaws.com");
        assert_eq!(env.name, "PutBucketTagging");
        assert_eq!(env.actor.kind, ActorKind::Root);
        assert_eq!(env.request_parameters["bucketName"], "b1");
    }

    #[test]
    fn normalizes_detail_wrapped_event() {
        let raw = json!({
            "detail-type": "AWS API Call via CloudTrail",
            "detail": {
                "eventSource": "dynamodb.amazonaws.com",
                "eventName": "TagResource",
                "userIdentity": {
                    "type": "AssumedRole",
                    "arn": "arn:aws:sts::1:assumed-role/deploy/ci"
                },
                "requestParameters": {"resourceArn": "arn:aws:dynamodb:us-east-1:1:table/t"}
            }
        });
        let env = Envelope::normalize(&raw).unwrap();
        assert_eq!(env.source, "dynamodb.amazonaws.com");
        assert_eq!(env.actor.kind, ActorKind::AssumedRole);
        assert_eq!(env.actor.principal_arn, "arn:aws:sts::1:assumed-role/deploy/ci");
    }

    #[test]
    fn missing_source_is_malformed() {
        let raw = json!({"eventName": "PutBucketTagging"});
        let err = Envelope::normalize(&raw).unwrap_err();
        assert_eq!(err.to_string(), "Event source not found");
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn missing_name_is_malformed() {
        let raw = json!({"eventSource": "s3.amazonaws.com"});
        let err = Envelope::normalize(&raw).unwrap_err();
        assert_eq!(err.to_string(), "Event name not found");
    }

    #[test]
    fn missing_identity_defaults_to_other() {
        let raw = json!({"eventSource": "s3.amazonaws.com", "eventName": "CreateBucket"});
        let env = Envelope::normalize(&raw).unwrap();
        assert_eq!(env.actor.kind, ActorKind::Other);
        assert!(env.actor.principal_arn.is_empty());
    }
}
