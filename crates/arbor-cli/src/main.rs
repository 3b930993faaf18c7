//! Arbor scenario runner
//!
//! Usage: `arbor <scenario.json>`
//!
//! Replays the scenario's steps against a fresh registry and prints a JSON
//! report with every step outcome, the final balances and the journal.

mod scenario;

use scenario::Scenario;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arbor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let path = std::env::args()
        .nth(1)
        .ok_or("usage: arbor <scenario.json>")?;

    let raw = tokio::fs::read_to_string(&path).await?;
    let scenario: Scenario = serde_json::from_str(&raw)?;
    tracing::info!("Replaying {} step(s) from {}", scenario.steps.len(), path);

    let report = scenario::replay(&scenario);
    let failed = report.outcomes.iter().filter(|o| !o.is_ok()).count();
    if failed > 0 {
        tracing::warn!("{} of {} step(s) failed", failed, report.outcomes.len());
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
