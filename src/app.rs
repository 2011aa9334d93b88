use std::net::SocketAddr;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{create_router, AppState};
use crate::config::Config;

/// Running HTTP host with its session
///
/// The session lives exactly as long as the process; there is no teardown
/// other than stopping the server.
pub struct Application {
    pub server_handle: JoinHandle<Result<(), std::io::Error>>,
    pub local_addr: SocketAddr,
    pub state: AppState,
}

impl Application {
    /// Bind the listener and spawn the Axum server
    pub async fn build(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Initializing application components");
        info!(
            "Yield value column: '{}', upload limit: {} MB",
            config.yield_value_column, config.max_upload_mb
        );

        let addr = config.server_addr();
        let state = AppState::new(config);
        let app = create_router(state.clone()).layer(TraceLayer::new_for_http());

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Server listening on {}", local_addr);

        let server_handle = tokio::spawn(async move { axum::serve(listener, app).await });

        Ok(Self {
            server_handle,
            local_addr,
            state,
        })
    }

    pub async fn run_until_stopped(self) -> Result<(), Box<dyn std::error::Error>> {
        self.server_handle.await??;
        Ok(())
    }
}
