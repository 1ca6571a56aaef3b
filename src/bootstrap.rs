use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::{
    api::handler::AppState,
    config::Config,
    disbursement::{
        directory::PgDisbursementDirectory, ApprovalPolicy, DisbursementOrchestrator,
        RemainderPolicy,
    },
    error::AppResult,
    group::GroupRepository,
    processor::HttpChargeProcessor,
    ratio::{RatioRepository, RatioResolver},
    webhook::WebhookVerifier,
};

pub async fn initialize_app_state(config: &Config) -> AppResult<AppState> {
    info!("Initializing application components ...");

    let pool = initialize_database(&config.database_url).await?;

    // Repositories
    let groups = Arc::new(GroupRepository::new(pool.clone()));
    let ratios = Arc::new(RatioRepository::new(pool.clone()));
    let ratio_resolver = Arc::new(RatioResolver::new(groups.clone(), ratios));

    // Payment processor client
    let processor = Arc::new(HttpChargeProcessor::new(
        &config.processor_base_url,
        &config.processor_api_key,
        config.charge_timeout_secs,
    )?);
    info!("✅ Payment processor client initialized");

    // Disbursement orchestration
    let directory = Arc::new(PgDisbursementDirectory::new(
        groups.clone(),
        ratio_resolver.clone(),
    ));
    let orchestrator = Arc::new(DisbursementOrchestrator::new(
        directory,
        processor,
        RemainderPolicy::default(),
        Duration::from_secs(config.charge_timeout_secs),
    ));
    info!("✅ Disbursement orchestrator initialized");

    let verifier = WebhookVerifier::new(&config.webhook_signing_secret);
    let approval_policy = ApprovalPolicy::new(config.approval_ceiling_minor_units);

    Ok(AppState {
        groups,
        ratio_resolver,
        orchestrator,
        verifier,
        approval_policy,
    })
}

async fn initialize_database(database_url: &str) -> AppResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;

    sqlx::migrate!().run(&pool).await?;

    info!("✅ Database pool established");
    Ok(pool)
}
