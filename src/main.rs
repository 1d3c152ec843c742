use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderValue, Method,
};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

use saleor_cod_app::apl::{Apl, FileApl, UpstashApl};
use saleor_cod_app::config::{AplBackend, AppConfig};
use saleor_cod_app::{app_router, webhook, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let apl: Arc<dyn Apl> = match config.apl_backend {
        AplBackend::File => {
            info!(path = %config.apl_file_path.display(), "using file APL");
            Arc::new(FileApl::new(config.apl_file_path.clone()))
        }
        AplBackend::Upstash => {
            // Presence of both parameters is enforced by AppConfig::from_env.
            let upstash = config
                .upstash
                .clone()
                .context("upstash configuration missing")?;
            info!(rest_url = %upstash.rest_url, "using upstash APL");
            Arc::new(UpstashApl::new(upstash.rest_url, upstash.rest_token))
        }
    };

    // Registrar output is built once here, at manifest-generation time.
    let webhooks = Arc::new(webhook::registered_webhooks());
    let state = AppState {
        config: Arc::new(config.clone()),
        apl,
        webhooks,
    };

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            ["http://localhost:3000", "http://localhost:5173"]
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        ))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([ACCEPT, CONTENT_TYPE]);

    let app = app_router(state).layer(cors);

    let addr = SocketAddr::new(config.host.parse()?, config.port);
    info!(%addr, "starting saleor-cod-app");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
