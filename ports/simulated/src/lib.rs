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

//! In-process stand-ins for the browser collaborators of the overlay host:
//! media elements, the camera and the scene graph.

pub mod camera;
pub mod media;
pub mod scene;

use std::sync::Arc;

pub use camera::{CameraPermission, SimulatedCamera};
pub use media::{AutoplayPolicy, SimulatedMediaPlayer};
pub use scene::SimulatedScene;

pub struct SimulatedPlatform {
    pub camera: Arc<SimulatedCamera>,
    pub scene: Arc<SimulatedScene>,
    pub autoplay: Arc<AutoplayPolicy>,
}

pub fn initialize_simulated_platform(permission: CameraPermission, user_activated: bool) -> SimulatedPlatform {
    let autoplay = Arc::new(AutoplayPolicy::new(user_activated));
    SimulatedPlatform {
        camera: Arc::new(SimulatedCamera::new(permission)),
        scene: Arc::new(SimulatedScene::new(autoplay.clone())),
        autoplay,
    }
}
