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

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};
use thiserror::Error;

use crate::debounce::{ControllerHandle, ControllerSnapshot, DebounceController};
use crate::definitions::{ContentEntry, TargetConfig, TargetIndex, DEFAULT_GRACE_PERIOD_MS};
use crate::scene::{SceneBuilder, SceneError, SceneNodes};
use crate::tracking::{TrackingError, TrackingSignalSource};

/// Error type for binding a content entry to a target
#[derive(Error, Debug, PartialEq, Clone)]
pub enum BindingError {
    #[error("Content entry {target} has no media source")]
    MissingMediaSource { target: TargetIndex },

    #[error("Content entry {target} has invalid aspect height {aspect_height}")]
    InvalidAspectHeight { target: TargetIndex, aspect_height: f64 },

    #[error("Target {target}: media {selector} not found in scene")]
    MediaNotFound { target: TargetIndex, selector: String },

    #[error("Target {target}: {source}")]
    Scene { target: TargetIndex, source: SceneError },

    #[error("Tracking source error: {0}")]
    Tracking(#[from] TrackingError),
}

impl BindingError {
    pub fn target(&self) -> TargetIndex {
        match self {
            Self::MissingMediaSource { target }
            | Self::InvalidAspectHeight { target, .. }
            | Self::MediaNotFound { target, .. }
            | Self::Scene { target, .. } => *target,
            Self::Tracking(TrackingError::AlreadySubscribed(target))
            | Self::Tracking(TrackingError::NoListener(target)) => *target,
        }
    }

    /// True for errors caused by the content list itself.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::MissingMediaSource { .. } | Self::InvalidAspectHeight { .. })
    }
}

/// Fixed association of one content entry with its target, scene nodes and
/// running controller.
pub struct TargetBinding {
    pub index: TargetIndex,
    pub entry: ContentEntry,
    pub config: TargetConfig,
    pub nodes: SceneNodes,
    controller: ControllerHandle,
}

impl TargetBinding {
    pub fn snapshot(&self) -> ControllerSnapshot {
        self.controller.snapshot()
    }

    pub fn controller(&self) -> &ControllerHandle {
        &self.controller
    }
}

/// All live bindings of a session, keyed by target index.
pub struct TargetRegistry {
    bindings: BTreeMap<TargetIndex, TargetBinding>,
    scene: Arc<dyn SceneBuilder>,
    source: Arc<dyn TrackingSignalSource>,
}

impl TargetRegistry {
    pub fn get(&self, index: TargetIndex) -> Option<&TargetBinding> {
        self.bindings.get(&index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetBinding> {
        self.bindings.values()
    }

    pub fn indices(&self) -> Vec<TargetIndex> {
        self.bindings.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn snapshots(&self) -> Vec<ControllerSnapshot> {
        self.bindings.values().map(TargetBinding::snapshot).collect()
    }

    /// Disposes every controller, detaches it from the tracking source and
    /// removes its scene nodes.
    pub async fn shutdown(self) {
        for (index, binding) in self.bindings {
            if let Err(e) = binding.controller.shutdown().await {
                error!("Controller of target {} did not stop cleanly: {}", index, e);
            }
            self.source.unsubscribe(index);
            self.scene.remove_target(index);
        }
        info!("Target registry shut down");
    }
}

/// Outcome of binding a content list. Failed entries do not prevent the
/// others from being bound.
pub struct BindReport {
    pub registry: TargetRegistry,
    pub failures: Vec<BindingError>,
}

/// Wires content entries to scene nodes, media and debounce controllers.
///
/// Binding spawns one controller task per target, so it must run inside a
/// tokio runtime.
pub struct ContentBinder {
    scene: Arc<dyn SceneBuilder>,
    source: Arc<dyn TrackingSignalSource>,
    default_grace_period: Duration,
}

impl ContentBinder {
    pub fn new(scene: Arc<dyn SceneBuilder>, source: Arc<dyn TrackingSignalSource>) -> Self {
        Self {
            scene,
            source,
            default_grace_period: Duration::from_millis(DEFAULT_GRACE_PERIOD_MS),
        }
    }

    /// Grace period for entries that do not set their own.
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.default_grace_period = grace_period;
        self
    }

    pub fn bind(&self, entries: &[ContentEntry]) -> BindReport {
        let mut bindings = BTreeMap::new();
        let mut failures = Vec::new();

        for (index, entry) in (0u32..).map(TargetIndex).zip(entries) {
            match self.bind_entry(index, entry) {
                Ok(binding) => {
                    debug!("Target {} bound to {}", index, binding.config.media_selector);
                    bindings.insert(index, binding);
                }
                Err(e) => {
                    error!("Failed to bind target {}: {}", index, e);
                    failures.push(e);
                }
            }
        }

        info!("Bound {} of {} content entries", bindings.len(), entries.len());
        BindReport {
            registry: TargetRegistry {
                bindings,
                scene: self.scene.clone(),
                source: self.source.clone(),
            },
            failures,
        }
    }

    fn bind_entry(&self, index: TargetIndex, entry: &ContentEntry) -> Result<TargetBinding, BindingError> {
        let media_source = entry
            .media_source
            .as_deref()
            .map(str::trim)
            .filter(|source| !source.is_empty())
            .ok_or(BindingError::MissingMediaSource { target: index })?;

        if !(entry.aspect_height.is_finite() && entry.aspect_height > 0.0) {
            return Err(BindingError::InvalidAspectHeight {
                target: index,
                aspect_height: entry.aspect_height,
            });
        }

        let nodes = self
            .scene
            .add_target(index, media_source, entry.aspect_height)
            .map_err(|source| BindingError::Scene { target: index, source })?;

        self.start_controller(index, entry, nodes).inspect_err(|_| {
            debug!("Removing scene nodes of target {}", index);
            self.scene.remove_target(index);
        })
    }

    fn start_controller(
        &self,
        index: TargetIndex,
        entry: &ContentEntry,
        nodes: SceneNodes,
    ) -> Result<TargetBinding, BindingError> {
        let config = TargetConfig {
            media_selector: nodes.target.media_selector.clone(),
            grace_period: entry
                .grace_period_ms
                .map(Duration::from_millis)
                .unwrap_or(self.default_grace_period),
        };

        let media = self
            .scene
            .locate_media(&config.media_selector)
            .ok_or_else(|| BindingError::MediaNotFound {
                target: index,
                selector: config.media_selector.clone(),
            })?;

        let signals = self.source.subscribe(index)?;
        let controller = DebounceController::with_config(index, media, &config).run(signals);

        Ok(TargetBinding {
            index,
            entry: entry.clone(),
            config,
            nodes,
            controller,
        })
    }
}
