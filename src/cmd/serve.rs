//! Local board API server command: `taskflow serve`.

use anyhow::Result;
use tracing::warn;

use taskflow::board::api::AppState;
use taskflow::board::server::{ServerConfig, start_server};
use taskflow::config::TaskflowConfig;

use super::workspace::Workspace;

pub async fn cmd_serve(
    config: &TaskflowConfig,
    port: Option<u16>,
    open: bool,
    dev: bool,
) -> Result<()> {
    let workspace = Workspace::open(config).await?;
    let state = AppState::new(
        workspace.session.clone(),
        workspace.task_store(),
        workspace.team_store(),
        workspace.event_store(),
        workspace.account_store(),
        workspace.functions.clone(),
    );
    let server_config = ServerConfig {
        port: port.unwrap_or_else(|| config.server_port()),
        dev_mode: dev,
    };

    // No browser inside containers in dev mode.
    if open && !dev {
        let url = format!("http://localhost:{}/api/board", server_config.port);
        tokio::spawn(async move {
            // Let the server bind first.
            tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
            if let Err(e) = open::that(&url) {
                warn!(error = %e, "failed to open browser");
            }
        });
    }

    start_server(server_config, state).await
}
