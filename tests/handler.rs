//! End-to-end handler scenarios over the in-memory gateways: real
//! CloudTrail-shaped events in, `{statusCode, body}` responses and recorded
//! gateway writes out.

use std::sync::Arc;

use serde_json::{json, Value};

use autotag::mock::MemoryTagGateway;
use autotag::{Enforcer, ResourceKind, Tag, TagGateway, TagPolicy};

struct Harness {
    enforcer: Enforcer,
    compute: Arc<MemoryTagGateway>,
    endpoint: Arc<MemoryTagGateway>,
    table: Arc<MemoryTagGateway>,
    bucket: Arc<MemoryTagGateway>,
    file_system: Arc<MemoryTagGateway>,
}

impl Harness {
    fn new() -> Self {
        let compute = Arc::new(MemoryTagGateway::new(ResourceKind::Compute));
        let endpoint = Arc::new(MemoryTagGateway::new(ResourceKind::Endpoint));
        let table = Arc::new(MemoryTagGateway::new(ResourceKind::Table));
        let bucket = Arc::new(MemoryTagGateway::new(ResourceKind::Bucket));
        let file_system = Arc::new(MemoryTagGateway::new(ResourceKind::FileSystem));
        let gateways: Vec<Arc<dyn TagGateway>> = vec![
            compute.clone(),
            endpoint.clone(),
            table.clone(),
            bucket.clone(),
            file_system.clone(),
        ];
        Self {
            enforcer: Enforcer::new(TagPolicy::default(), gateways),
            compute,
            endpoint,
            table,
            bucket,
            file_system,
        }
    }

    fn total_writes(&self) -> usize {
        self.compute.write_count()
            + self.endpoint.write_count()
            + self.table.write_count()
            + self.bucket.write_count()
            + self.file_system.write_count()
    }
}

fn mandatory() -> Vec<Tag> {
    vec![Tag::new("Division", "CD"), Tag::new("Studio", "Ajax")]
}

fn bucket_event(name: &str, bucket: &str) -> Value {
    json!({
        "detail": {
            "eventSource": "s3.amazonaws.com",
            "eventName": name,
            "userIdentity": {"type": "Root", "arn": "arn:aws:iam::361769560345:root"},
            "requestParameters": {"bucketName": bucket, "Host": "s3.amazonaws.com"}
        }
    })
}

#[tokio::test]
async fn bucket_with_no_tags_gets_the_mandatory_set() {
    let h = Harness::new();
    let resp = h.enforcer.handle(&bucket_event("PutBucketTagging", "b1")).await;

    assert_eq!(resp.status_code, 200);
    assert_eq!(h.bucket.writes(), vec![("b1".to_string(), mandatory())]);
}

#[tokio::test]
async fn compliant_bucket_is_resubmitted_unchanged() {
    let h = Harness::new();
    let seeded = vec![
        Tag::new("Division", "CD"),
        Tag::new("Studio", "Ajax"),
        Tag::new("Env", "prod"),
    ];
    h.bucket.seed("b1", seeded.clone());

    let resp = h.enforcer.handle(&bucket_event("PutBucketTagging", "b1")).await;

    assert_eq!(resp.status_code, 200);
    // Whole-set replace resubmits all three tags, no duplicates appended.
    assert_eq!(h.bucket.writes(), vec![("b1".to_string(), seeded.clone())]);
    assert_eq!(h.bucket.tags_of("b1"), seeded);
}

#[tokio::test]
async fn delete_bucket_tagging_forces_the_mandatory_set_back() {
    let h = Harness::new();
    let resp = h.enforcer.handle(&bucket_event("DeleteBucketTagging", "alphalion")).await;

    assert_eq!(resp.status_code, 200);
    assert!(resp.body.contains("re-applied"));
    assert_eq!(h.bucket.writes(), vec![("alphalion".to_string(), mandatory())]);
}

#[tokio::test]
async fn missing_event_source_is_a_client_error_with_no_writes() {
    let h = Harness::new();
    let event = json!({"detail": {"eventName": "PutBucketTagging"}});

    let resp = h.enforcer.handle(&event).await;

    assert_eq!(resp.status_code, 400);
    assert_eq!(resp.body, "Event source not found");
    assert_eq!(h.total_writes(), 0);
}

#[tokio::test]
async fn own_corrective_write_is_ignored() {
    let h = Harness::new();
    let event = json!({
        "detail": {
            "eventSource": "dynamodb.amazonaws.com",
            "eventName": "TagResource",
            "userIdentity": {
                "type": "AssumedRole",
                "arn": "arn:aws:sts::361769560345:assumed-role/lambda-autotag-role/autotag"
            },
            "requestParameters": {"resourceArn": "arn:aws:dynamodb:us-east-1:1:table/orders"}
        }
    });

    let resp = h.enforcer.handle(&event).await;

    assert_eq!(resp.status_code, 200);
    assert_eq!(resp.body, "Ignored event to prevent infinite loop");
    assert_eq!(h.total_writes(), 0);
}

#[tokio::test]
async fn reserved_tags_are_never_resubmitted() {
    let h = Harness::new();
    h.bucket.seed(
        "b1",
        vec![
            Tag::new("aws:cloudformation:stack-name", "net-stack"),
            Tag::new("Env", "prod"),
        ],
    );

    let resp = h.enforcer.handle(&bucket_event("PutBucketTagging", "b1")).await;

    assert_eq!(resp.status_code, 200);
    let (_, submitted) = &h.bucket.writes()[0];
    assert!(submitted.iter().all(|t| !t.key.starts_with("aws:")));
    assert_eq!(
        submitted,
        &vec![Tag::new("Env", "prod"), Tag::new("Division", "CD"), Tag::new("Studio", "Ajax")]
    );
}

#[tokio::test]
async fn instance_gap_fill_submits_only_missing_tags() {
    let h = Harness::new();
    h.compute.seed("i-0123456789abcdef0", vec![Tag::new("Division", "CD")]);
    let event = json!({
        "eventSource": "ec2.amazonaws.com",
        "eventName": "CreateTags",
        "userIdentity": {"type": "IAMUser", "arn": "arn:aws:iam::1:user/dev"},
        "requestParameters": {"resourcesSet": {"items": [{"resourceId": "i-0123456789abcdef0"}]}}
    });

    let resp = h.enforcer.handle(&event).await;

    assert_eq!(resp.status_code, 200);
    // Incremental API: only the absent mandatory tag goes on the wire.
    assert_eq!(
        h.compute.writes(),
        vec![("i-0123456789abcdef0".to_string(), vec![Tag::new("Studio", "Ajax")])]
    );
}

#[tokio::test]
async fn compliant_instance_issues_no_write() {
    let h = Harness::new();
    h.compute.seed("i-0123456789abcdef0", mandatory());
    let event = json!({
        "eventSource": "ec2.amazonaws.com",
        "eventName": "CreateTags",
        "requestParameters": {"resourcesSet": {"items": [{"resourceId": "i-0123456789abcdef0"}]}}
    });

    let resp = h.enforcer.handle(&event).await;

    assert_eq!(resp.status_code, 200);
    assert_eq!(h.compute.write_count(), 0);
}

#[tokio::test]
async fn untag_file_system_forces_reapply() {
    let h = Harness::new();
    let event = json!({
        "detail": {
            "eventSource": "elasticfilesystem.amazonaws.com",
            "eventName": "UntagResource",
            "requestParameters": {"resourceId": "fs-1234abcd"}
        }
    });

    let resp = h.enforcer.handle(&event).await;

    assert_eq!(resp.status_code, 200);
    assert_eq!(h.file_system.tags_of("fs-1234abcd"), mandatory());
}

#[tokio::test]
async fn new_vpc_endpoint_is_tagged_from_the_creation_response() {
    let h = Harness::new();
    let event = json!({
        "detail": {
            "eventSource": "ec2.amazonaws.com",
            "eventName": "CreateVpcEndpoint",
            "requestParameters": {"vpcId": "vpc-1"},
            "responseElements": {
                "CreateVpcEndpointResponse": {
                    "vpcEndpoint": {"vpcEndpointId": "vpce-0abc"}
                }
            }
        }
    });

    let resp = h.enforcer.handle(&event).await;

    assert_eq!(resp.status_code, 200);
    assert_eq!(h.endpoint.tags_of("vpce-0abc"), mandatory());
}

#[tokio::test]
async fn new_table_is_tagged_from_the_creation_response() {
    let h = Harness::new();
    let event = json!({
        "detail": {
            "eventSource": "dynamodb.amazonaws.com",
            "eventName": "CreateTable",
            "requestParameters": {"tableName": "orders"},
            "responseElements": {
                "tableDescription": {"tableArn": "arn:aws:dynamodb:us-east-1:1:table/orders"}
            }
        }
    });

    let resp = h.enforcer.handle(&event).await;

    assert_eq!(resp.status_code, 200);
    assert_eq!(h.table.tags_of("arn:aws:dynamodb:us-east-1:1:table/orders"), mandatory());
}

#[tokio::test]
async fn unsupported_source_is_a_client_error() {
    let h = Harness::new();
    let event = json!({
        "eventSource": "rds.amazonaws.com",
        "eventName": "AddTagsToResource",
        "requestParameters": {}
    });

    let resp = h.enforcer.handle(&event).await;

    assert_eq!(resp.status_code, 400);
    assert_eq!(resp.body, "Unsupported event source: rds.amazonaws.com");
    assert_eq!(h.total_writes(), 0);
}

#[tokio::test]
async fn missing_resource_id_is_a_client_error() {
    let h = Harness::new();
    let event = json!({
        "eventSource": "s3.amazonaws.com",
        "eventName": "PutBucketTagging",
        "requestParameters": {"tagging": ""}
    });

    let resp = h.enforcer.handle(&event).await;

    assert_eq!(resp.status_code, 400);
    assert_eq!(resp.body, "Bucket name not found in the event");
    assert_eq!(h.total_writes(), 0);
}
