use billing_service::{config::BillingConfig, services, startup::Application};
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Must run before any metrics are recorded.
    services::init_metrics();

    let config = BillingConfig::load()?;
    init_tracing("billing-service", &config.common.log.level, config.common.log.json);

    let application = Application::build(config).await?;
    application.run_until_stopped().await?;

    Ok(())
}
