// Copyright 2025 HEM Sp. z o.o.
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

use std::str::FromStr;

use overlay_core::definitions::{TargetIndex, TrackingEvent};

/// Line-based commands accepted on stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Signal(TargetIndex, TrackingEvent),
    /// Simulated user gesture that unblocks unmuted playback.
    Tap,
    Status,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let verb = words.next().ok_or_else(|| "Empty command".to_string())?;
        let command = match verb.to_lowercase().as_str() {
            "found" | "lost" => {
                let index = words
                    .next()
                    .ok_or_else(|| format!("Missing target index after '{}'", verb))?
                    .parse::<u32>()
                    .map_err(|e| format!("Invalid target index: {}", e))?;
                let event = if verb.eq_ignore_ascii_case("found") {
                    TrackingEvent::Found
                } else {
                    TrackingEvent::Lost
                };
                Command::Signal(TargetIndex(index), event)
            }
            "tap" => Command::Tap,
            "status" => Command::Status,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("Unknown command: {}", other)),
        };
        if let Some(extra) = words.next() {
            return Err(format!("Unexpected argument: {}", extra));
        }
        Ok(command)
    }
}

pub const HELP: &str = "commands: found <i> | lost <i> | tap | status | quit";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_signals() {
        assert_eq!("found 0".parse::<Command>(), Ok(Command::Signal(TargetIndex(0), TrackingEvent::Found)));
        assert_eq!("  LOST   12 ".parse::<Command>(), Ok(Command::Signal(TargetIndex(12), TrackingEvent::Lost)));
    }

    #[test]
    fn parses_keywords() {
        assert_eq!("tap".parse::<Command>(), Ok(Command::Tap));
        assert_eq!("status".parse::<Command>(), Ok(Command::Status));
        assert_eq!("exit".parse::<Command>(), Ok(Command::Quit));
    }

    #[test]
    fn rejects_bad_input() {
        assert!("".parse::<Command>().is_err());
        assert!("found".parse::<Command>().is_err());
        assert!("found x".parse::<Command>().is_err());
        assert!("lost 1 2".parse::<Command>().is_err());
        assert!("jump".parse::<Command>().is_err());
    }
}
