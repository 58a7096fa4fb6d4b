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

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use log::{debug, info};
use overlay_core::media::{MediaError, MediaPlayerInterface, MediaState};

/// Page-wide autoplay rule: unmuted playback needs a prior user gesture.
#[derive(Debug, Default)]
pub struct AutoplayPolicy {
    user_activated: AtomicBool,
}

impl AutoplayPolicy {
    pub fn new(user_activated: bool) -> Self {
        Self {
            user_activated: AtomicBool::new(user_activated),
        }
    }

    pub fn grant_user_activation(&self) {
        info!("User activation granted, unmuted playback allowed");
        self.user_activated.store(true, Ordering::SeqCst);
    }

    pub fn allows(&self, muted: bool) -> bool {
        muted || self.user_activated.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackCounters {
    pub play_requests: u32,
    pub pause_requests: u32,
    pub blocked_requests: u32,
}

/// Looping media element living in memory.
pub struct SimulatedMediaPlayer {
    source: String,
    policy: Arc<AutoplayPolicy>,
    state: Mutex<MediaState>,
    counters: Mutex<PlaybackCounters>,
}

impl SimulatedMediaPlayer {
    pub fn new(source: impl Into<String>, policy: Arc<AutoplayPolicy>) -> Self {
        Self {
            source: source.into(),
            policy,
            state: Mutex::new(MediaState::default()),
            counters: Mutex::new(PlaybackCounters::default()),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn state(&self) -> MediaState {
        *self.state.lock().unwrap()
    }

    pub fn counters(&self) -> PlaybackCounters {
        *self.counters.lock().unwrap()
    }
}

#[async_trait]
impl MediaPlayerInterface for SimulatedMediaPlayer {
    async fn get_current_state(&self) -> Result<MediaState, MediaError> {
        Ok(self.state())
    }

    async fn play(&self) -> Result<(), MediaError> {
        let mut state = self.state.lock().unwrap();
        let mut counters = self.counters.lock().unwrap();
        counters.play_requests += 1;
        if !self.policy.allows(state.muted) {
            counters.blocked_requests += 1;
            return Err(MediaError::PlaybackBlocked(format!(
                "{}: unmuted play() requires a user gesture",
                self.source
            )));
        }
        state.paused = false;
        info!("{} playing", self.source);
        Ok(())
    }

    async fn pause(&self) -> Result<(), MediaError> {
        self.state.lock().unwrap().paused = true;
        self.counters.lock().unwrap().pause_requests += 1;
        info!("{} paused", self.source);
        Ok(())
    }

    async fn set_muted(&self, muted: bool) -> Result<(), MediaError> {
        self.state.lock().unwrap().muted = muted;
        debug!("{} muted: {}", self.source, muted);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_paused_muted_and_looping() {
        let media = SimulatedMediaPlayer::new("a.mp4", Arc::new(AutoplayPolicy::default()));
        assert_eq!(media.state(), MediaState { paused: true, muted: true, looping: true });
        assert!(media.is_paused().await.unwrap());
    }

    #[tokio::test]
    async fn muted_autoplay_is_allowed_without_gesture() {
        let media = SimulatedMediaPlayer::new("a.mp4", Arc::new(AutoplayPolicy::default()));
        media.play().await.unwrap();
        assert!(!media.state().paused);
    }

    #[tokio::test]
    async fn unmuted_play_waits_for_user_activation() {
        let policy = Arc::new(AutoplayPolicy::default());
        let media = SimulatedMediaPlayer::new("a.mp4", policy.clone());
        media.set_muted(false).await.unwrap();
        assert!(matches!(media.play().await, Err(MediaError::PlaybackBlocked(_))));
        assert!(media.state().paused);

        policy.grant_user_activation();
        media.play().await.unwrap();
        assert!(!media.state().paused);
        assert_eq!(media.counters(), PlaybackCounters { play_requests: 2, pause_requests: 0, blocked_requests: 1 });
    }
}
