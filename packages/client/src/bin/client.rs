//! Terminal meeting client.
//!
//! Joins one meeting, shows the transcript, attendees and the running poll,
//! and sends chat and commands typed at the prompt. Reconnects automatically
//! after ordinary disconnects, resuming after the last received entry.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin agora-client -- --meeting 1 --key alice-key
//! cargo run --bin agora-client -- -m 1 -k admin-key --user-id 1 --admin
//! ```

use std::time::Duration;

use clap::Parser;

use agora_client::{ClientConfig, run_client};
use agora_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "agora-client")]
#[command(about = "Realtime meeting client with chat, presence and polls", long_about = None)]
struct Args {
    /// Base WebSocket address of the meeting server
    #[arg(short = 'u', long, env = "AGORA_URL", default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// Meeting to join
    #[arg(short = 'm', long, env = "AGORA_MEETING")]
    meeting: String,

    /// Access key
    #[arg(short = 'k', long, env = "AGORA_KEY")]
    key: String,

    /// Own attendee id
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    user_id: i64,

    /// Show administrative controls
    #[arg(long)]
    admin: bool,

    /// Delay before reconnecting after a dropped connection
    #[arg(long, default_value_t = 2000)]
    reconnect_delay_ms: u64,

    /// Lowest close code that stops reconnecting
    #[arg(long, default_value_t = 4000)]
    fatal_close_floor: u16,
}

#[tokio::main]
async fn main() {
    // Log to stderr at warn by default so the transcript stays readable
    setup_logger(env!("CARGO_BIN_NAME"), "warn");

    let args = Args::parse();

    let config = ClientConfig {
        url: args.url,
        meeting: args.meeting,
        key: args.key,
        user_id: args.user_id,
        admin: args.admin,
        reconnect_delay: Duration::from_millis(args.reconnect_delay_ms),
        fatal_close_floor: args.fatal_close_floor,
    };

    if let Err(e) = run_client(config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
