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

pub mod definitions;
pub mod media;
pub mod tracking;
pub mod debounce;
pub mod scene;
pub mod binder;
pub mod camera;
pub mod status;
pub mod config;

mod service;

pub use service::{OverlayService, ServiceError};
pub use media::{MediaPlayer, MediaPlayerInterface};
pub use debounce::{ControllerHandle, ControllerSnapshot, ControllerState, DebounceController};
pub use binder::{BindReport, BindingError, ContentBinder, TargetRegistry};
pub use tracking::{ChannelTrackingSource, TrackingSignalSource, TrackingSubscription};
pub use config::OverlayConfig;
