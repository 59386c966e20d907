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

//! Command-line interface definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::color::Color;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Use an in-memory transport and log what would be sent
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List paired Bluetooth devices
    Devices {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Connect, send one or more colors, and disconnect
    Send {
        /// Device display name
        #[arg(short, long)]
        device: Option<String>,
        /// Colors as #RRGGBB or r,g,b
        #[arg(required = true)]
        colors: Vec<Color>,
    },
    /// Read colors and commands from stdin
    Interactive {
        /// Device to connect to on start
        #[arg(short, long)]
        device: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_send() {
        let cli = Cli::parse_from(["rgb-relay", "send", "-d", "HC-06", "#FF8000", "0,255,0"]);
        match cli.command {
            Commands::Send { device, colors } => {
                assert_eq!(device.as_deref(), Some("HC-06"));
                assert_eq!(colors, vec![Color::new(255, 128, 0), Color::new(0, 255, 0)]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_bad_color() {
        assert!(Cli::try_parse_from(["rgb-relay", "send", "purple"]).is_err());
        assert!(Cli::try_parse_from(["rgb-relay", "send"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["rgb-relay", "devices", "--json", "--dry-run", "-v"]);
        assert!(cli.dry_run);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Devices { json: true }));
    }
}
