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

use async_trait::async_trait;
use log::{error, info};
use thiserror::Error;
use uuid::Uuid;

use crate::definitions::{CameraConstraints, FacingMode};
use crate::status::StatusReporter;

pub const STATUS_CAMERA_READY: &str = "Camera ready";
pub const STATUS_CAMERA_FAILED: &str = "Camera access denied or unavailable";
pub const STATUS_CAMERA_STOPPED: &str = "Camera stopped";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("Camera access is not supported on this platform")]
    NotSupported,
    #[error("Camera permission denied")]
    PermissionDenied,
    #[error("Camera device unavailable: {0}")]
    DeviceUnavailable(String),
}

/// Open video stream as handed out by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraStream {
    pub id: Uuid,
    pub constraints: CameraConstraints,
}

impl CameraStream {
    pub fn new(constraints: CameraConstraints) -> Self {
        Self {
            id: Uuid::new_v4(),
            constraints,
        }
    }
}

#[async_trait]
pub trait CameraBackend: Send + Sync {
    /// Whether the platform exposes camera capture at all.
    fn is_supported(&self) -> bool {
        true
    }

    async fn open_stream(&self, constraints: &CameraConstraints) -> Result<CameraStream, CameraError>;

    /// Stops every track of `stream`.
    async fn close_stream(&self, stream: &CameraStream);
}

/// Renderer-side consumer of the camera stream.
pub trait StreamSink {
    fn attach_stream(&mut self, stream: &CameraStream);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CameraStatus {
    pub active: bool,
    pub has_stream: bool,
}

/// Caller-owned camera access state. Each session is independent; nothing
/// is shared between instances.
pub struct CameraSession {
    backend: Arc<dyn CameraBackend>,
    reporter: Arc<dyn StatusReporter>,
    constraints: CameraConstraints,
    stream: Option<CameraStream>,
    active: bool,
}

impl CameraSession {
    pub fn new(
        backend: Arc<dyn CameraBackend>,
        constraints: CameraConstraints,
        reporter: Arc<dyn StatusReporter>,
    ) -> Self {
        Self {
            backend,
            reporter,
            constraints,
            stream: None,
            active: false,
        }
    }

    pub fn is_compatible(&self) -> bool {
        self.backend.is_supported()
    }

    pub fn constraints(&self) -> &CameraConstraints {
        &self.constraints
    }

    pub fn stream(&self) -> Option<&CameraStream> {
        self.stream.as_ref()
    }

    pub fn status(&self) -> CameraStatus {
        CameraStatus {
            active: self.active,
            has_stream: self.stream.is_some(),
        }
    }

    /// Opens a stream with the current constraints. A stream that is already
    /// open is stopped first, even when the new request fails.
    pub async fn request_access(&mut self) -> Result<&CameraStream, CameraError> {
        self.stop().await;
        if !self.backend.is_supported() {
            return Err(self.fail(CameraError::NotSupported));
        }

        info!(
            "Requesting camera access (facing {}, ideal {}x{}, audio {})",
            self.constraints.facing_mode,
            self.constraints.width_ideal,
            self.constraints.height_ideal,
            self.constraints.audio
        );
        match self.backend.open_stream(&self.constraints).await {
            Ok(stream) => {
                self.active = true;
                info!("Camera initialized, stream {}", stream.id);
                self.reporter.report(STATUS_CAMERA_READY);
                Ok(&*self.stream.insert(stream))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    pub async fn stop(&mut self) {
        let Some(stream) = self.stream.take() else {
            return;
        };
        self.backend.close_stream(&stream).await;
        self.active = false;
        info!("Camera stream {} stopped", stream.id);
        self.reporter.report(STATUS_CAMERA_STOPPED);
    }

    /// Restarts capture with another camera.
    pub async fn switch_camera(&mut self, facing_mode: FacingMode) -> Result<&CameraStream, CameraError> {
        self.stop().await;
        self.constraints.facing_mode = facing_mode;
        self.request_access().await
    }

    /// Hands the open stream to `sink`. Returns `false` when there is none.
    pub fn attach_to(&self, sink: &mut dyn StreamSink) -> bool {
        match &self.stream {
            Some(stream) => {
                sink.attach_stream(stream);
                true
            }
            None => {
                error!("Unable to attach camera stream: no stream open");
                false
            }
        }
    }

    fn fail(&mut self, e: CameraError) -> CameraError {
        self.active = false;
        error!("Camera initialization error: {}", e);
        self.reporter.report(STATUS_CAMERA_FAILED);
        e
    }
}
