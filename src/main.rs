mod backend;
mod config;
mod event;
mod handler;
mod query;

pub const USER_AGENT: &str = concat!("occurrence-search/", env!("CARGO_PKG_VERSION"));

use backend::{SearchClient, SigV4Signer};
use config::SearchConfig;
use handler::SearchHandler;
use lambda_runtime::service_fn;
use query::QueryTranslator;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("occurrence_search=info".parse()?),
        )
        // CloudWatch stamps each line on ingestion.
        .without_time()
        .with_ansi(false)
        .init();

    let config = SearchConfig::from_env()
        .inspect_err(|e| tracing::error!("invalid configuration: {e}"))?;
    let signer = SigV4Signer::from_env(&config.signing_service, config.region.as_deref()).await?;
    let client = SearchClient::new(&config, signer)?;
    info!(
        url = %client.url(),
        exact_fields = ?config.exact_fields,
        "starting occurrence search function"
    );

    let handler = SearchHandler::new(QueryTranslator::new(config.exact_fields), client);
    lambda_runtime::run(service_fn(|event| handler.handle(event))).await
}
