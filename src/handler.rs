use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info};

use crate::event::Envelope;
use crate::handler_core::{
    HandlerError, ReconcileMode, ResourceKind, Response, TagGateway, TagPolicy,
};
use crate::reconcile;

/// Top-level handler: one audit event in, one response out. Stateless
/// between invocations; holds only the immutable policy and the per-kind
/// gateways built at startup.
pub struct Enforcer {
    policy: TagPolicy,
    gateways: Vec<Arc<dyn TagGateway>>,
}

impl Enforcer {
    pub fn new(policy: TagPolicy, gateways: Vec<Arc<dyn TagGateway>>) -> Self {
        Self { policy, gateways }
    }

    /// Every failure is converted to a response here; a malformed or
    /// adversarial event must never escape as a panic or an unhandled error.
    pub async fn handle(&self, event: &Value) -> Response {
        match self.try_handle(event).await {
            Ok(resp) => resp,
            Err(err) => {
                error!(status = err.status_code(), "{err}");
                Response::from(&err)
            }
        }
    }

    async fn try_handle(&self, event: &Value) -> Result<Response, HandlerError> {
        let envelope = Envelope::normalize(event)?;
        info!(source = %envelope.source, name = %envelope.name, "received event");

        if self.policy.is_self_triggered(&envelope.actor, &envelope.name) {
            info!("event triggered by our own corrective write; skipping");
            return Ok(Response::ok("Ignored event to prevent infinite loop"));
        }

        let (kind, mode) = ResourceKind::classify(&envelope.source, &envelope.name)?;
        let gateway = self.gateway(kind)?;
        let resource = gateway.extract_id(&envelope)?;
        info!(kind = %resource.kind, id = %resource.id, ?mode, "reconciling");

        let plan = match mode {
            ReconcileMode::GapFill => {
                let current = gateway.read_tags(&resource).await?;
                reconcile::gap_fill(&current, &self.policy.mandatory, &self.policy.reserved_prefix)
            }
            ReconcileMode::ForceReapply => reconcile::force_reapply(&self.policy.mandatory),
        };

        gateway.write_tags(&resource, &plan).await?;
        info!(added = plan.added.len(), total = plan.tags.len(), "tags reconciled");

        let body = match mode {
            ReconcileMode::GapFill => {
                format!("Tags handled for {} {}", resource.kind, resource.id)
            }
            ReconcileMode::ForceReapply => {
                format!("Mandatory tags re-applied for {} {}", resource.kind, resource.id)
            }
        };
        Ok(Response::ok(body))
    }

    fn gateway(&self, kind: ResourceKind) -> Result<&Arc<dyn TagGateway>, HandlerError> {
        self.gateways.iter().find(|g| g.kind() == kind).ok_or_else(|| {
            HandlerError::UnsupportedEventKind(format!("No gateway configured for {kind}"))
        })
    }
}
