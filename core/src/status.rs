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

use std::sync::Mutex;
use log::info;

/// Sink for user-facing status lines.
pub trait StatusReporter: Send + Sync {
    fn report(&self, message: &str);
}

/// Writes status lines to the log.
pub struct LogStatusReporter;

impl StatusReporter for LogStatusReporter {
    fn report(&self, message: &str) {
        info!("Status: {}", message);
    }
}

/// Keeps every reported line so a UI can show the latest one.
#[derive(Default)]
pub struct StatusBoard {
    messages: Mutex<Vec<String>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<String> {
        self.messages.lock().unwrap().last().cloned()
    }

    pub fn history(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl StatusReporter for StatusBoard {
    fn report(&self, message: &str) {
        info!("Status: {}", message);
        self.messages.lock().unwrap().push(message.to_string());
    }
}
