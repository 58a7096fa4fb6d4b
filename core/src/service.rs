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

use std::sync::Arc;

use log::{debug, info, warn};
use thiserror::Error;

use crate::binder::{BindingError, ContentBinder, TargetRegistry};
use crate::camera::{CameraError, CameraSession};
use crate::config::OverlayConfig;
use crate::scene::SceneBuilder;
use crate::tracking::TrackingSignalSource;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("Camera initialization failed: {0}")]
    Camera(#[from] CameraError),
}

/// Session state of the overlay host: the camera plus every bound target.
pub struct OverlayService {
    camera: CameraSession,
    registry: Option<TargetRegistry>,
    binding_failures: Vec<BindingError>,
}

impl OverlayService {
    pub fn new(camera: CameraSession) -> Self {
        Self {
            camera,
            registry: None,
            binding_failures: Vec::new(),
        }
    }

    /// Opens the camera, then binds the configured content. A camera failure
    /// is returned before any target is bound.
    pub async fn start(
        &mut self,
        config: &OverlayConfig,
        scene: Arc<dyn SceneBuilder>,
        source: Arc<dyn TrackingSignalSource>,
    ) -> Result<&TargetRegistry, ServiceError> {
        info!("Starting overlay service");
        if self.is_running() {
            warn!("Overlay service is already running, stopping it first");
            self.stop().await;
        }

        self.camera.request_access().await?;

        debug!("Binding {} content entries", config.content.len());
        let report = ContentBinder::new(scene, source)
            .with_grace_period(config.grace_period())
            .bind(&config.content);
        self.binding_failures = report.failures;
        if !self.binding_failures.is_empty() {
            warn!("{} content entries could not be bound", self.binding_failures.len());
        }

        info!("Overlay service started with {} targets", report.registry.len());
        Ok(&*self.registry.insert(report.registry))
    }

    pub async fn stop(&mut self) {
        info!("Stopping overlay service");
        if let Some(registry) = self.registry.take() {
            registry.shutdown().await;
        }
        self.camera.stop().await;
    }

    pub fn is_running(&self) -> bool {
        self.registry.is_some()
    }

    pub fn registry(&self) -> Option<&TargetRegistry> {
        self.registry.as_ref()
    }

    /// Entries rejected by the last start.
    pub fn binding_failures(&self) -> &[BindingError] {
        &self.binding_failures
    }

    pub fn camera(&self) -> &CameraSession {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraSession {
        &mut self.camera
    }
}
