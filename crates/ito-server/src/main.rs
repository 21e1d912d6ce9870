//! ITO session server.
//!
//! Configuration comes from the environment:
//! - `ITO_BIND` — listen address (default `0.0.0.0:3000`)
//! - `ITO_THEMES` — optional theme catalog JSON file
//! - `RUST_LOG` — log filter (default `info`)

mod settings;

use ito::prelude::*;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::settings::Settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    let settings = Settings::from_env();

    let mut builder = ItoServer::builder().bind(&settings.bind);
    if let Some(path) = &settings.themes {
        builder = builder.theme_catalog(ThemeCatalog::load(path)?);
    }
    let server = builder.build().await?;
    tracing::info!(addr = %server.local_addr()?, "listening");

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("ctrl-c received");
        })
        .await?;

    Ok(())
}
