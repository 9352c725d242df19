//! Client execution: wires the terminal to a meeting session.

use tokio::sync::mpsc;

use crate::{
    config::ClientConfig,
    error::ClientError,
    infrastructure::WebSocketConnector,
    usecase::{MeetingClient, MeetingSession},
};

use super::{
    formatter::ViewFormatter, input::spawn_input_thread, renderer::TerminalRenderer,
};

/// Run the meeting client until the user quits
pub async fn run_client(config: ClientConfig) -> Result<(), ClientError> {
    config.validate()?;
    let settings = config.settings();

    tracing::info!(
        "Joining meeting {} at {} (admin: {})",
        config.meeting,
        config.url,
        settings.is_admin
    );
    println!(
        "\nJoining meeting {}. Type messages and press Enter to send. /help lists commands.\n",
        config.meeting
    );
    print!("{}", ViewFormatter::format_help(settings.is_admin));

    let client = MeetingClient::new(config.target(), config.policy(), settings);
    let session = MeetingSession::new(client, WebSocketConnector, TerminalRenderer::stdout());

    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    spawn_input_thread(settings, commands_tx, session.link_state())
        .await
        .map_err(|_| ClientError::Terminal("input thread exited".to_string()))?
        .map_err(ClientError::Terminal)?;

    let client = session.run(commands_rx).await;

    tracing::info!(
        "Left meeting {} after {} transcript entries",
        config.meeting,
        client.transcript().len()
    );
    Ok(())
}
