// Copyright 2026 The Ollama Relay Project
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use ollama_relay::config::Config;
use ollama_relay::routes;
use ollama_relay::upstream::OllamaClient;

use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ollama-relay", about = "Authenticated HTTP relay for a local Ollama backend")]
struct Cli {
    /// Shared secret callers must present in the x-api-key header
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    api_key: String,

    /// Base URL of the Ollama backend
    #[arg(long, default_value = "http://127.0.0.1:11434", env = "OLLAMA_URL")]
    upstream_url: String,

    /// Port to listen on
    #[arg(long, default_value_t = 3000, env = "PORT")]
    port: u16,

    /// Logical model name for the generic /api/ai routes
    #[arg(long, default_value = "llama3.2-vision", env = "MODEL")]
    model: String,

    /// Timeout for buffered generate calls, in seconds
    #[arg(long, default_value_t = 120, env = "REQUEST_TIMEOUT_SECS")]
    request_timeout_secs: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .json()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match Config::new(
        cli.api_key,
        cli.upstream_url,
        cli.request_timeout_secs,
        &cli.model,
    ) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            tracing::error!("invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        upstream_url = %config.upstream_url,
        generic_model = config.generic_model.backend_id(),
        "configuration loaded"
    );

    let upstream = Arc::new(OllamaClient::new(reqwest::Client::new(), &config));
    let app = routes::build_router(config, upstream);

    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind to address");

    tracing::info!(%addr, "ollama-relay listening");

    axum::serve(listener, app).await.expect("server error");
}
