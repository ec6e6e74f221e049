use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use usage_ledger::api::{self, ApiState};
use usage_ledger::config::Config;
use usage_ledger::db::Store;
use usage_ledger::meters::app::AppMeter;
use usage_ledger::meters::service::ServiceMeter;
use usage_ledger::meters::Meter;
use usage_ledger::platform::http::HttpPlatformClient;
use usage_ledger::platform::oauth2::TokenProvider;
use usage_ledger::platform::PlatformClient;
use usage_ledger::scheduler::{queue, workers, MEASURE_USAGE, POST_USAGE};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("startup error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    tracing::info!("starting usage-ledger engine");

    let store = Arc::new(Store::connect(&config.database_url).await?);
    store.migrate().await?;

    let token_provider = TokenProvider::new(
        format!("{}/oauth/token", config.upstream_api_url),
        config.upstream_client_id.clone(),
        config.upstream_client_secret.clone(),
    );
    let platform: Arc<dyn PlatformClient> =
        Arc::new(HttpPlatformClient::new(config.upstream_api_url.clone(), token_provider));

    let meters: Arc<Vec<Box<dyn Meter>>> = Arc::new(vec![
        Box::new(ServiceMeter::new(platform.clone())),
        Box::new(AppMeter::new(platform.clone())),
    ]);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let crontab_handle = tokio::spawn(queue::run_crontab(store.clone(), shutdown_rx.clone()));

    let measure_job_timeout = config.job_timeout();
    let measure_store = store.clone();
    let measure_meters = meters.clone();
    let measure_worker_handle = tokio::spawn(async move {
        queue::run_worker(measure_store, MEASURE_USAGE, measure_job_timeout, move |store, args, job_id| {
            let meters = measure_meters.clone();
            async move { workers::measure_usage_worker(store, args, job_id, meters).await }
        })
        .await;
    });

    let post_store = store.clone();
    let billing_timezone: Arc<str> = Arc::from(config.billing_timezone.as_str());
    let post_worker_handle = tokio::spawn(async move {
        queue::run_worker(post_store, POST_USAGE, std::time::Duration::from_secs(10 * 60), move |store, args, job_id| {
            let billing_timezone = billing_timezone.clone();
            async move { workers::post_usage_worker(store, args, job_id, billing_timezone).await }
        })
        .await;
    });

    let decoding_key = match &config.oidc_jwt_public_key {
        Some(pem) => Some(Arc::new(jsonwebtoken::DecodingKey::from_rsa_pem(pem.as_bytes())?)),
        None => {
            if !config.debug_disable_auth {
                tracing::warn!("OIDC_JWT_PUBLIC_KEY not set: protected admin routes will return 500 until it is configured or DEBUG_DISABLE_AUTH is set");
            }
            None
        }
    };

    let api_state = ApiState {
        store: store.clone(),
        oidc_issuer: Arc::from(config.oidc_issuer.as_str()),
        decoding_key,
        disable_auth: config.debug_disable_auth,
    };
    let app = api::router(api_state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(addr, "admin HTTP surface listening");

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received shutdown signal");
        }
    }

    let _ = shutdown_tx.send(true);
    crontab_handle.abort();
    measure_worker_handle.abort();
    post_worker_handle.abort();

    Ok(())
}
