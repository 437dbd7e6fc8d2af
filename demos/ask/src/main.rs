//! Ask one query and print its answers.
//!
//! Run with: `PENGINE_URL=http://localhost:4242/pengine cargo run -p pengine-ask -- 'member(X, [a,b])'`
//!
//! `PENGINE_APPLICATION` and `PENGINE_CHUNK` are optional. Ctrl-C stops the
//! query.

use anyhow::{Context, Result};
use pengine_client::{CancellationToken, Client, ClientConfig, Solution};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn config_from_env() -> Result<ClientConfig> {
    let url = std::env::var("PENGINE_URL").context("PENGINE_URL is not set")?;
    let mut config = ClientConfig::new(url);
    if let Ok(application) = std::env::var("PENGINE_APPLICATION") {
        config = config.with_application(application);
    }
    if let Ok(chunk) = std::env::var("PENGINE_CHUNK") {
        config = config.with_chunk(chunk.parse().context("PENGINE_CHUNK must be a number")?);
    }
    Ok(config)
}

fn render(solution: &Solution) -> String {
    let mut names: Vec<_> = solution.keys().collect();
    names.sort();
    names
        .into_iter()
        .map(|name| format!("{name} = {}", solution[name].to_host()))
        .collect::<Vec<_>>()
        .join(", ")
}

async fn run(query: &str, cancel: &CancellationToken) -> Result<()> {
    let client = Client::new(config_from_env()?);
    let mut answers = client.ask(query, cancel).await?;
    while answers.next(cancel).await {
        if let Some(solution) = answers.current() {
            if solution.is_empty() {
                println!("true.");
            } else {
                println!("{}.", render(solution));
            }
        }
    }
    for output in answers.outputs() {
        tracing::info!(%output, "server output");
    }
    tracing::info!(
        successes = answers.successes(),
        time = ?answers.cumulative(),
        "query finished"
    );
    match answers.final_error() {
        Some(pengine_client::PengineError::Failed) => {
            println!("false.");
            Ok(())
        }
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let query = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let result = if query.trim().is_empty() {
        Err(anyhow::anyhow!("usage: pengine-ask <query>"))
    } else {
        run(&query, &cancel).await
    };
    if let Err(err) = result {
        tracing::error!("{err:#}");
        std::process::exit(1);
    }
}
