//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    error::ServerError,
    usecase::{
        ConnectAttendeeUseCase, DisconnectAttendeeUseCase, HandleCommandUseCase, MeetingContext,
    },
};

use super::{
    handler::{health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Meeting server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(context);
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    context: MeetingContext,
}

impl Server {
    /// Create a new Server instance
    ///
    /// # Arguments
    ///
    /// * `context` - Meeting state shared by the use cases
    pub fn new(context: MeetingContext) -> Self {
        Self { context }
    }

    /// Build the router with all endpoints
    pub fn router(self) -> Router {
        let app_state = Arc::new(AppState {
            connect_attendee_usecase: ConnectAttendeeUseCase::new(self.context.clone()),
            disconnect_attendee_usecase: DisconnectAttendeeUseCase::new(self.context.clone()),
            handle_command_usecase: HandleCommandUseCase::new(self.context),
        });

        Router::new()
            // WebSocket エンドポイント
            .route("/ws/{meeting}/{key}/{since}", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Run the meeting server until Ctrl+C
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), ServerError> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Meeting server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}
