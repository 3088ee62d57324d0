// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! BluZone relay console.
//!
//! Connects to the configured endpoint, sends stdin lines and prints what
//! the other side sends back. Lines starting with `:` are console commands.

use anyhow::Result;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bluzone_relay::config::{Config, EndpointConfig};
use bluzone_relay::console::{self, Action};
use bluzone_relay::events::EventProcessor;
use bluzone_relay::relay::{Connection, InboundEvent, StreamRelay};
use bluzone_relay::state::SessionState;

/// How a session ended.
enum SessionEnd {
    /// Back to the console; `:connect` starts a new session.
    Disconnected,
    /// Quit the program.
    Exit,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; it carries the default log filter.
    let config = match std::env::args_os().nth(1) {
        Some(path) => Config::load_from(&PathBuf::from(path))?,
        None => Config::load()?,
    };

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.filter)),
        )
        .init();

    info!("Starting BluZone relay v{}...", env!("CARGO_PKG_VERSION"));

    let state = SessionState::new();
    let mut input_rx = spawn_input_reader();
    let mut connect = true;

    loop {
        if connect {
            connect = false;
            match open_session(&config, &state, &mut input_rx).await {
                Ok(SessionEnd::Exit) => break,
                Ok(SessionEnd::Disconnected) => {}
                Err(e) => {
                    error!("Connection failed: {:#}", e);
                    eprintln!("Connection failed: {:#}", e);
                }
            }
            eprintln!("Not connected. Type :connect to retry, :exit to quit.");
        }

        tokio::select! {
            line = input_rx.recv() => {
                let Some(line) = line else {
                    info!("Input closed");
                    break;
                };
                match console::dispatch(&line, &state) {
                    Action::Connect => connect = true,
                    Action::Exit => break,
                    Action::Print(text) => eprint!("{}", text),
                    // Only produced while connected.
                    Action::Send(_) | Action::Disconnect => {}
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!("BluZone relay stopped");
    Ok(())
}

async fn open_session(
    config: &Config,
    state: &Arc<SessionState>,
    input_rx: &mut mpsc::Receiver<String>,
) -> Result<SessionEnd> {
    match &config.endpoint {
        EndpointConfig::Tcp { address } => {
            info!("Connecting to {}", address);
            let stream = tokio::net::TcpStream::connect(address).await?;
            run_session(stream, config, state, input_rx).await
        }
        #[cfg(feature = "rfcomm")]
        EndpointConfig::Rfcomm { address, channel } => {
            let stream = bluzone_relay::relay::connect_rfcomm(address, *channel).await?;
            run_session(stream, config, state, input_rx).await
        }
        #[cfg(not(feature = "rfcomm"))]
        EndpointConfig::Rfcomm { .. } => {
            anyhow::bail!("RFCOMM endpoints need the `rfcomm` feature")
        }
    }
}

async fn run_session<S: Connection>(
    stream: S,
    config: &Config,
    state: &Arc<SessionState>,
    input_rx: &mut mpsc::Receiver<String>,
) -> Result<SessionEnd> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<InboundEvent>();
    let relay = StreamRelay::with_config(stream, event_tx, &config.relay)?;

    state.set_connected(relay.peer().to_string());
    info!("Connected to {}", relay.peer());

    // Handle relay events
    let state_events = state.clone();
    let mut event_task = tokio::spawn(async move {
        let mut processor =
            EventProcessor::new(state_events, std::io::stdout(), std::io::stderr());

        while let Some(event) = event_rx.recv().await {
            match processor.process_event(event) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => error!("Error processing relay event: {}", e),
            }
        }
    });

    let read_task = relay.start()?;

    eprintln!("Connected to {}. Type :help for commands.", relay.peer());

    let end = loop {
        tokio::select! {
            line = input_rx.recv() => {
                let Some(line) = line else {
                    info!("Input closed");
                    break SessionEnd::Exit;
                };
                match console::dispatch(&line, state) {
                    Action::Send(bytes) => {
                        // Failures are reported through SendFailed.
                        let _ = relay.send(&bytes).await;
                    }
                    Action::Disconnect => break SessionEnd::Disconnected,
                    Action::Exit => break SessionEnd::Exit,
                    Action::Print(text) => eprint!("{}", text),
                    Action::Connect => {}
                }
            }
            _ = &mut event_task => {
                break SessionEnd::Disconnected;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break SessionEnd::Exit;
            }
        }
    };

    relay.close().await;
    if let Err(e) = read_task.await {
        error!("Read loop panicked: {}", e);
    }
    drop(relay);
    if !event_task.is_finished() {
        let _ = event_task.await;
    }

    let counters = state.get_counters();
    info!(
        "Session ended ({}) after {}: {} bytes in, {} bytes out, {} failed sends",
        state.get_status().as_str(),
        state
            .uptime()
            .map(console::format_uptime)
            .unwrap_or_else(|| "0s".to_string()),
        counters.bytes_received,
        counters.bytes_sent,
        counters.send_failures
    );
    Ok(end)
}

/// Read stdin lines on a plain thread so a pending read never holds up
/// runtime shutdown.
fn spawn_input_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to read input: {}", e);
                    break;
                }
            }
        }
    });
    rx
}
