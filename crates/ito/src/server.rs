//! `ItoServer` builder and server loop.
//!
//! This is the entry point for running an ITO session server. It ties
//! together all the layers: transport → protocol → session → room.

use std::future::Future;
use std::sync::Arc;

use ito_protocol::{Codec, JsonCodec};
use ito_room::{RandomSource, RoomConfig, RoomRegistry, ThemeCatalog, ThreadRandom};
use ito_session::ConnectionTracker;
use ito_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::ItoError;

/// Default listen address, matching the port browser clients expect.
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The room
/// registry locks its own index; the connection tracker's mutex is never
/// held while a room is awaited.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) rooms: RoomRegistry,
    pub(crate) connections: Mutex<ConnectionTracker>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting an ITO server.
///
/// # Example
///
/// ```rust,no_run
/// use ito::prelude::*;
///
/// # async fn run() -> Result<(), ItoError> {
/// let server = ItoServer::builder()
///     .bind("127.0.0.1:3000")
///     .room_config(RoomConfig::default())
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct ItoServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    catalog: Option<ThemeCatalog>,
    rng: Arc<dyn RandomSource>,
}

impl ItoServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            room_config: RoomConfig::default(),
            catalog: None,
            rng: Arc::new(ThreadRandom),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the number range, vote size and room limits.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Replaces the built-in theme catalog.
    pub fn theme_catalog(mut self, catalog: ThemeCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Replaces the randomness source (seed it for reproducible runs).
    pub fn random_source(mut self, rng: impl RandomSource) -> Self {
        self.rng = Arc::new(rng);
        self
    }

    /// Validates the configuration and binds the listener.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    ///
    /// # Errors
    /// Returns [`ItoError::Room`] for an invalid room config or a catalog
    /// too small for a vote, and [`ItoError::Transport`] if binding fails.
    pub async fn build(self) -> Result<ItoServer<JsonCodec>, ItoError> {
        let catalog = self.catalog.unwrap_or_else(ThemeCatalog::builtin);
        let registry = RoomRegistry::new(self.room_config, Arc::new(catalog), self.rng)?;

        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            rooms: registry,
            connections: Mutex::new(ConnectionTracker::new()),
            codec: JsonCodec,
        });

        Ok(ItoServer { transport, state })
    }
}

impl Default for ItoServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound ITO server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ItoServer<C: Codec = JsonCodec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl ItoServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> ItoServerBuilder {
        ItoServerBuilder::new()
    }
}

impl<C: Codec> ItoServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), ItoError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes, then stops every
    /// room.
    ///
    /// Spawns a handler task per accepted connection. A failed accept is
    /// logged and the loop continues.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), ItoError> {
        let addr = self.local_addr().ok();
        tracing::info!(?addr, "ITO server running");

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(
                                    error = %e,
                                    "connection ended with error"
                                );
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        tracing::info!("shutting down");
        self.state.rooms.shutdown_all().await;
        Ok(())
    }
}
