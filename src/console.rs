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

//! Console command dispatch.
//!
//! Lines starting with `:` are commands (`:status`, `:connect`,
//! `:disconnect`, `:exit`, `:help`). Every other line is payload. A payload
//! line that itself starts with `:` is written as `::`.

use std::fmt::Write;

use crate::state::SessionState;

/// Marks a console line as a command.
pub const COMMAND_PREFIX: char = ':';

pub const HELP: &str = "\
Commands:
  :connect     connect to the configured endpoint
  :status      show the session status
  :disconnect  close the current connection
  :exit        close the connection and quit
  :help        show this help
Other lines are sent as-is. Start a line with '::' to send a leading ':'.
";

/// Console commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect,
    Status,
    Disconnect,
    Exit,
    Help,
}

impl Command {
    /// Parse a command name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "connect" => Some(Command::Connect),
            "status" => Some(Command::Status),
            "disconnect" => Some(Command::Disconnect),
            "exit" | "quit" => Some(Command::Exit),
            "help" | "?" => Some(Command::Help),
            _ => None,
        }
    }
}

/// A classified console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Command(Command),
    Unknown(String),
    Data(String),
}

/// Classify a line read from the console.
pub fn parse_line(line: &str) -> ConsoleInput {
    match line.strip_prefix(COMMAND_PREFIX) {
        Some(rest) if rest.starts_with(COMMAND_PREFIX) => ConsoleInput::Data(rest.to_string()),
        Some(rest) => match Command::parse(rest) {
            Some(command) => ConsoleInput::Command(command),
            None => ConsoleInput::Unknown(rest.trim().to_string()),
        },
        None => ConsoleInput::Data(line.to_string()),
    }
}

/// What the console loop should do with a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Send these bytes over the relay.
    Send(Vec<u8>),
    Connect,
    Disconnect,
    Exit,
    /// Show this text to the user.
    Print(String),
}

/// Decide what a console line means given the current session.
pub fn dispatch(line: &str, state: &SessionState) -> Action {
    let connected = state.is_connected();

    match parse_line(line) {
        ConsoleInput::Data(mut data) => {
            if !connected {
                return Action::Print("Not connected, input discarded.\n".to_string());
            }
            data.push('\n');
            Action::Send(data.into_bytes())
        }
        ConsoleInput::Command(Command::Connect) if connected => Action::Print(format!(
            "Already connected to {}.\n",
            state.get_peer().unwrap_or_default()
        )),
        ConsoleInput::Command(Command::Connect) => Action::Connect,
        ConsoleInput::Command(Command::Disconnect) if !connected => {
            Action::Print("Not connected.\n".to_string())
        }
        ConsoleInput::Command(Command::Disconnect) => Action::Disconnect,
        ConsoleInput::Command(Command::Status) => Action::Print(status_report(state)),
        ConsoleInput::Command(Command::Exit) => Action::Exit,
        ConsoleInput::Command(Command::Help) => Action::Print(HELP.to_string()),
        ConsoleInput::Unknown(name) => Action::Print(format!(
            "Unknown command ':{}'. Type :help for a list.\n",
            name
        )),
    }
}

/// Multi-line session summary for the `status` command.
pub fn status_report(state: &SessionState) -> String {
    let counters = state.get_counters();
    let mut report = String::new();

    let _ = writeln!(report, "Status:       {}", state.get_status().as_str());
    if let Some(peer) = state.get_peer() {
        let _ = writeln!(report, "Peer:         {}", peer);
    }
    if state.is_connected() {
        if let Some(uptime) = state.uptime() {
            let _ = writeln!(report, "Uptime:       {}", format_uptime(uptime));
        }
    }
    let _ = writeln!(report, "Received:     {} bytes", counters.bytes_received);
    let _ = writeln!(report, "Sent:         {} bytes", counters.bytes_sent);
    let _ = writeln!(report, "Failed sends: {}", counters.send_failures);
    if let Some(failure) = state.get_last_failure() {
        let _ = writeln!(report, "Last failure: {}", failure);
    }
    if let Some(cause) = state.get_close_cause() {
        let _ = writeln!(report, "Closed:       {}", cause);
    }
    report
}

/// Format an uptime as `1h 02m 03s`, `2m 03s` or `3s`.
pub fn format_uptime(uptime: chrono::Duration) -> String {
    let total = uptime.num_seconds().max(0);
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
