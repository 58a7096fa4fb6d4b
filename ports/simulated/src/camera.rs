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

use async_trait::async_trait;
use log::info;
use overlay_core::camera::{CameraBackend, CameraError, CameraStream};
use overlay_core::definitions::CameraConstraints;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CameraPermission {
    #[default]
    Granted,
    Denied,
    NoDevice,
    Unsupported,
}

/// Camera that grants or refuses access according to a fixed permission.
#[derive(Default)]
pub struct SimulatedCamera {
    permission: Mutex<CameraPermission>,
    open_streams: Mutex<Vec<Uuid>>,
}

impl SimulatedCamera {
    pub fn new(permission: CameraPermission) -> Self {
        Self {
            permission: Mutex::new(permission),
            open_streams: Mutex::new(Vec::new()),
        }
    }

    pub fn set_permission(&self, permission: CameraPermission) {
        *self.permission.lock().unwrap() = permission;
    }

    pub fn open_stream_count(&self) -> usize {
        self.open_streams.lock().unwrap().len()
    }
}

#[async_trait]
impl CameraBackend for SimulatedCamera {
    fn is_supported(&self) -> bool {
        *self.permission.lock().unwrap() != CameraPermission::Unsupported
    }

    async fn open_stream(&self, constraints: &CameraConstraints) -> Result<CameraStream, CameraError> {
        let permission = *self.permission.lock().unwrap();
        match permission {
            CameraPermission::Granted => {
                let stream = CameraStream::new(constraints.clone());
                self.open_streams.lock().unwrap().push(stream.id);
                info!("Simulated camera stream {} opened", stream.id);
                Ok(stream)
            }
            CameraPermission::Denied => Err(CameraError::PermissionDenied),
            CameraPermission::NoDevice => Err(CameraError::DeviceUnavailable("no video input device".into())),
            CameraPermission::Unsupported => Err(CameraError::NotSupported),
        }
    }

    async fn close_stream(&self, stream: &CameraStream) {
        self.open_streams.lock().unwrap().retain(|id| *id != stream.id);
        info!("Simulated camera stream {} closed", stream.id);
    }
}
