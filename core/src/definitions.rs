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

use std::fmt;
use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Grace period applied when neither the entry nor the service overrides it.
pub const DEFAULT_GRACE_PERIOD_MS: u64 = 500;

pub const DEFAULT_CAMERA_WIDTH: u32 = 1280;
pub const DEFAULT_CAMERA_HEIGHT: u32 = 720;

/// Index of a target as known by the tracker. Assigned from the position of
/// the content entry in the configured list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetIndex(pub u32);

impl fmt::Display for TargetIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TargetIndex {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// One overlay definition: which media to show on a target and how tall the
/// overlay plane is relative to its unit width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEntry {
    #[serde(default)]
    pub media_source: Option<String>,
    pub aspect_height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grace_period_ms: Option<u64>,
}

impl ContentEntry {
    pub fn new(media_source: impl Into<String>, aspect_height: f64) -> Self {
        Self {
            media_source: Some(media_source.into()),
            aspect_height,
            grace_period_ms: None,
        }
    }

    pub fn with_grace_period_ms(mut self, grace_period_ms: u64) -> Self {
        self.grace_period_ms = Some(grace_period_ms);
        self
    }
}

/// Configuration surface of a single target binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    pub media_selector: String,
    pub grace_period: Duration,
}

impl TargetConfig {
    pub fn new(media_selector: impl Into<String>) -> Self {
        Self {
            media_selector: media_selector.into(),
            grace_period: Duration::from_millis(DEFAULT_GRACE_PERIOD_MS),
        }
    }
}

/// Discrete signal emitted by the tracker for one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingEvent {
    Found,
    Lost,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    #[default]
    Environment,
    User,
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacingMode::Environment => write!(f, "environment"),
            FacingMode::User => write!(f, "user"),
        }
    }
}

/// Constraints handed to the camera provider when requesting a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CameraConstraints {
    pub facing_mode: FacingMode,
    pub width_ideal: u32,
    pub height_ideal: u32,
    pub audio: bool,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::Environment,
            width_ideal: DEFAULT_CAMERA_WIDTH,
            height_ideal: DEFAULT_CAMERA_HEIGHT,
            audio: false,
        }
    }
}
