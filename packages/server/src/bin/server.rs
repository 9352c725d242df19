//! Development meeting server.
//!
//! Serves one meeting: chat transcript, attendee presence, polls and
//! administrative commands over WebSocket at `/ws/{meeting}/{key}/{since}`.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin agora-server
//! cargo run --bin agora-server -- --port 3000 --open \
//!     --attendee admin-key=1:Admin:admin --attendee alice-key=2:Alice
//! ```

use clap::Parser;

use agora_server::config::{AttendeeAccess, ServerConfig, default_attendees};
use agora_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "agora-server")]
#[command(about = "Development meeting server with chat, presence and polls", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Id of the meeting served
    #[arg(short = 'm', long, default_value = "1")]
    meeting: String,

    /// Access key, written KEY=ID:NAME[:admin] (repeatable)
    #[arg(short = 'a', long = "attendee")]
    attendees: Vec<AttendeeAccess>,

    /// UTC offset of entry timestamps, in hours
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    utc_offset_hours: i32,

    /// Start with the meeting open
    #[arg(long)]
    open: bool,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    let attendees = if args.attendees.is_empty() {
        tracing::info!("No attendees configured, using the default keys");
        default_attendees()
    } else {
        args.attendees
    };
    for access in &attendees {
        tracing::info!(
            "Key {} admits {} (id {}{})",
            access.key,
            access.attendee.name,
            access.attendee.id,
            if access.attendee.admin { ", admin" } else { "" }
        );
    }

    let config = ServerConfig {
        meeting_id: args.meeting,
        attendees,
        utc_offset_hours: args.utc_offset_hours,
        open: args.open,
    };

    if let Err(e) = config.build().run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
