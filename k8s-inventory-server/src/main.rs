use std::sync::Arc;
use std::time::Duration;

use clap::Parser as _;
use k8s_inventory::MetricBuffer;
use k8s_inventory::NodeSource;
use k8s_inventory_collector::NodeCollector;
use k8s_inventory_kubeapi::KubeApi;
use tokio::sync::RwLock;
use tokio::time;
use tokio_util::sync::CancellationToken;

use axum::extract::State;
use axum::http::header;
use axum::{Json, Router, response::IntoResponse, routing::get};

use config::Config;
use inventory::Inventory;

mod config;
mod inventory;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let config = Config::parse();
    tracing::info!(?config, "Starting k8s-inventory-server");

    let mut kubeapi = KubeApi::new().await?;
    if let Some(selector) = &config.label_selector {
        kubeapi = kubeapi.label_selector(selector);
    }
    let collector = NodeCollector::new(kubeapi);
    let inventory = Arc::new(Inventory::default());

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_on_ctrl_c(cancel.clone()));
    let collection = tokio::spawn(inventory::collect_nodes(
        collector,
        inventory.clone(),
        config.interval,
        cancel.clone(),
    ));

    let app = router(inventory);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Listening on http://{addr}");
    }
    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    cancel.cancel();
    collection.await?;

    Ok(())
}

fn router(inventory: Arc<Inventory>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route("/records", get(records))
        .with_state(inventory)
}

async fn shutdown_on_ctrl_c(cancel: CancellationToken) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "Failed to listen for ctrl-c");
        return;
    }
    tracing::info!("Shutting down");
    cancel.cancel();
}

async fn metrics(State(inventory): State<Arc<Inventory>>) -> impl IntoResponse {
    let text = inventory.latest().await.to_line_protocol();
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text)
}

async fn records(State(inventory): State<Arc<Inventory>>) -> Json<MetricBuffer> {
    Json(inventory.latest().await)
}

async fn healthz() -> &'static str {
    "ok"
}
