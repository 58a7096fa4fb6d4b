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
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum MediaError {
    /// The platform refused to start playback without a user gesture.
    #[error("Playback blocked: {0}")]
    PlaybackBlocked(String),
    #[error("Media source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("Feature not supported")]
    FeatureNotSupported,
    #[error("Unknown error: {0}")]
    UnknownError(String),
}

/// Playback snapshot as reported by the media element itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaState {
    pub paused: bool,
    pub muted: bool,
    pub looping: bool,
}

impl Default for MediaState {
    fn default() -> Self {
        Self {
            paused: true,
            muted: true,
            looping: true,
        }
    }
}

#[async_trait]
pub trait MediaPlayerInterface: Send + Sync {
    async fn get_current_state(&self) -> Result<MediaState, MediaError>
    {
        Err(MediaError::FeatureNotSupported)
    }
    async fn is_paused(&self) -> Result<bool, MediaError>
    {
        Ok(self.get_current_state().await?.paused)
    }
    async fn play(&self) -> Result<(), MediaError>
    {
        Err(MediaError::FeatureNotSupported)
    }
    async fn pause(&self) -> Result<(), MediaError>
    {
        Err(MediaError::FeatureNotSupported)
    }
    async fn set_muted(&self, _muted: bool) -> Result<(), MediaError>
    {
        Err(MediaError::FeatureNotSupported)
    }
}

/// Cheaply cloneable handle to a platform media element.
#[derive(Clone)]
pub struct MediaPlayer {
    player_impl: Arc<dyn MediaPlayerInterface>,
}

impl MediaPlayer {
    pub fn new(player_impl: Arc<dyn MediaPlayerInterface>) -> Self {
        Self { player_impl }
    }
}

impl std::fmt::Debug for MediaPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaPlayer").finish_non_exhaustive()
    }
}

#[async_trait]
impl MediaPlayerInterface for MediaPlayer {
    async fn get_current_state(&self) -> Result<MediaState, MediaError> {
        self.player_impl.get_current_state().await
    }
    async fn is_paused(&self) -> Result<bool, MediaError> {
        self.player_impl.is_paused().await
    }
    async fn play(&self) -> Result<(), MediaError> {
        self.player_impl.play().await
    }
    async fn pause(&self) -> Result<(), MediaError> {
        self.player_impl.pause().await
    }
    async fn set_muted(&self, muted: bool) -> Result<(), MediaError> {
        self.player_impl.set_muted(muted).await
    }
}
