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

//! Interactive console input.

use anyhow::{bail, Result};
use std::io::BufRead;
use tokio::sync::mpsc;
use tracing::debug;

use crate::color::Color;

pub const HELP: &str = "\
Commands:
  devices          list paired devices
  connect <name>   connect to a device by name
  disconnect       close the connection
  status           show connection status
  help             show this help
  quit             exit
Anything else is read as a color: #RRGGBB, RRGGBB or r,g,b";

/// One line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Devices,
    Connect(String),
    Disconnect,
    Status,
    Help,
    Quit,
    Color(Color),
    Empty,
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word {
            "" => Self::Empty,
            "devices" => Self::Devices,
            "connect" => {
                if rest.is_empty() {
                    bail!("Usage: connect <name>");
                }
                // Device names may contain spaces.
                Self::Connect(rest.to_string())
            }
            "disconnect" => Self::Disconnect,
            "status" => Self::Status,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            _ => Self::Color(line.parse()?),
        };

        Ok(command)
    }
}

/// Read lines on a dedicated thread and forward them to the async side.
///
/// A blocked read on this thread never holds up runtime shutdown. The
/// channel closes at end of input or after a read error.
pub fn spawn_line_reader<R>(reader: R) -> mpsc::Receiver<std::io::Result<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in reader.lines() {
            let failed = line.is_err();
            if tx.blocking_send(line).is_err() || failed {
                break;
            }
        }
        debug!("Console reader finished");
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_line_reader_forwards_lines() {
        let mut rx = spawn_line_reader(Cursor::new("connect HC-06\n#00FF00\n"));

        assert_eq!(rx.recv().await.unwrap().unwrap(), "connect HC-06");
        assert_eq!(rx.recv().await.unwrap().unwrap(), "#00FF00");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_line_reader_does_not_block_shutdown() {
        // A reader that never yields a line stands in for an idle terminal.
        struct Idle;
        impl std::io::Read for Idle {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                loop {
                    std::thread::park();
                }
            }
        }

        let mut rx = spawn_line_reader(std::io::BufReader::new(Idle));
        let waited =
            tokio::time::timeout(std::time::Duration::from_millis(50), rx.recv()).await;
        assert!(waited.is_err());
        drop(rx);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(ConsoleCommand::parse("  ").unwrap(), ConsoleCommand::Empty);
        assert_eq!(ConsoleCommand::parse("devices").unwrap(), ConsoleCommand::Devices);
        assert_eq!(
            ConsoleCommand::parse("connect Desk Strip").unwrap(),
            ConsoleCommand::Connect("Desk Strip".to_string())
        );
        assert!(ConsoleCommand::parse("connect").is_err());
        assert_eq!(ConsoleCommand::parse("exit").unwrap(), ConsoleCommand::Quit);
    }

    #[test]
    fn test_parse_colors() {
        assert_eq!(
            ConsoleCommand::parse("#00FF00").unwrap(),
            ConsoleCommand::Color(Color::new(0, 255, 0))
        );
        assert_eq!(
            ConsoleCommand::parse("255, 128, 0").unwrap(),
            ConsoleCommand::Color(Color::new(255, 128, 0))
        );
        assert!(ConsoleCommand::parse("blue").is_err());
    }
}
