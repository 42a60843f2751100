mod dynamodb;
mod ec2;
mod efs;
mod s3;

use std::sync::Arc;

use crate::handler_core::TagGateway;

/// One gateway per governed resource kind, all sharing the loaded SDK
/// config. EC2 backs two kinds: instances and VPC endpoints.
pub fn build_gateways(conf: &aws_config::SdkConfig) -> Vec<Arc<dyn TagGateway>> {
    vec![
        Arc::new(ec2::Ec2TagGateway::new(conf)),
        Arc::new(ec2::VpcEndpointTagGateway::new(conf)),
        Arc::new(dynamodb::DynamoTagGateway::new(conf)),
        Arc::new(s3::S3TagGateway::new(conf)),
        Arc::new(efs::EfsTagGateway::new(conf)),
    ]
}
