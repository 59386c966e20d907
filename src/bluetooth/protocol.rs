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

//! LED controller line protocol.
//!
//! Each color is one ASCII line: `R<r>G<g>B<b>\n`, decimal channels without
//! padding. The controller sends nothing back.

use uuid::Uuid;

use crate::color::Color;

/// Standard SPP UUID.
pub const SPP_UUID: Uuid = Uuid::from_u128(0x00001101_0000_1000_8000_00805F9B34FB);

/// Encode a color triple as a controller command line.
pub fn encode(r: u8, g: u8, b: u8) -> String {
    format!("R{}G{}B{}\n", r, g, b)
}

/// A single encoded command, ready to be written to the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command(String);

impl Command {
    /// Create the command for a color.
    pub fn color(color: Color) -> Self {
        Self(encode(color.red, color.green, color.blue))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl From<Color> for Command {
    fn from(color: Color) -> Self {
        Self::color(color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_without_padding() {
        assert_eq!(encode(255, 128, 0), "R255G128B0\n");
        assert_eq!(encode(5, 0, 255), "R5G0B255\n");
        assert_eq!(encode(0, 0, 0), "R0G0B0\n");
    }

    #[test]
    fn test_encode_every_channel_value() {
        for v in 0..=255u8 {
            assert_eq!(encode(v, 0, 0), format!("R{}G0B0\n", v));
            assert_eq!(encode(0, v, 0), format!("R0G{}B0\n", v));
            assert_eq!(encode(0, 0, v), format!("R0G0B{}\n", v));
        }
    }

    #[test]
    fn test_command_from_color() {
        let cmd = Command::from(Color::new(0, 255, 0));
        assert_eq!(cmd.as_str(), "R0G255B0\n");
        assert_eq!(cmd.as_bytes(), b"R0G255B0\n");
    }

    #[test]
    fn test_spp_uuid() {
        assert_eq!(
            SPP_UUID.to_string().to_uppercase(),
            "00001101-0000-1000-8000-00805F9B34FB"
        );
    }
}
