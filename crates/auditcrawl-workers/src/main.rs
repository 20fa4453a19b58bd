use std::sync::Arc;

use anyhow::{Context, Result};
use auditcrawl_config::WorkerConfig;
use auditcrawl_issues::IssueCatalogue;
use auditcrawl_types::ports::job_store::JobStore;
use auditcrawl_types::ports::oracle::PerformanceOracle;
use auditcrawl_workers::{JobController, PageSpeedOracle};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = WorkerConfig::from_env().context("loading worker configuration from the environment")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        poll_backstop_secs = config.poll_backstop_secs,
        resume_backstop_secs = config.resume_backstop_secs,
        stale_job_secs = config.stale_job_secs,
        "starting AuditCrawl worker"
    );

    let pool = auditcrawl_store::connect(&config.job_store_url, &config.job_store_credential)
        .await
        .context("connecting to the job store")?;
    auditcrawl_store::migrate(&pool).await.context("running job store migrations")?;
    let job_store = Arc::new(auditcrawl_store::PostgresJobStore::new(pool));

    let http = reqwest::Client::builder()
        .build()
        .context("building the shared HTTP client")?;

    let definitions = job_store.load_issue_catalogue().await.context("loading issue catalogue")?;
    let catalogue = IssueCatalogue::from_definitions(definitions);
    tracing::info!(issue_codes = catalogue.len(), "loaded issue catalogue");

    let oracle: Option<Arc<dyn PerformanceOracle>> = config
        .performance_oracle_api_key
        .as_ref()
        .map(|key| Arc::new(PageSpeedOracle::new(http.clone(), key.clone())) as Arc<dyn PerformanceOracle>);
    if oracle.is_none() {
        tracing::info!("no performance-oracle API key configured; oracle step will be skipped");
    }

    let controller = Arc::new(JobController::new(job_store, catalogue, oracle, http, config));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let controller_task = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.run(shutdown_rx).await })
    };

    tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")?;
    tracing::info!("received shutdown signal, cancelling in-flight job");
    let _ = shutdown_tx.send(true);

    match controller_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::error!(error = %e, "job controller exited with an error");
            return Err(e.into());
        }
        Err(e) => tracing::error!(error = %e, "job controller task panicked"),
    }

    tracing::info!("AuditCrawl worker shutdown complete");
    Ok(())
}
