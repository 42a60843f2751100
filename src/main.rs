use std::io::Read;

use anyhow::Context;
use aws_config::BehaviorVersion;
use tracing_subscriber::EnvFilter;

use autotag::{gateways, mock, Enforcer, TagPolicy};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Event JSON comes from a file argument or stdin.
    let raw = match std::env::args().nth(1) {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading event from {path}"))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("reading event from stdin")?;
            buf
        }
    };
    let event: serde_json::Value = serde_json::from_str(&raw).context("parsing event JSON")?;

    let enforcer = if std::env::var("MOCK_MODE").is_ok() {
        Enforcer::new(TagPolicy::default(), mock::build_gateways())
    } else {
        let conf = aws_config::load_defaults(BehaviorVersion::latest()).await;
        Enforcer::new(TagPolicy::default(), gateways::build_gateways(&conf))
    };

    let response = enforcer.handle(&event).await;
    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}
