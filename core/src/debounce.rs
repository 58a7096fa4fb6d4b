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

//! Tracking-loss debounce controller.
//!
//! One controller exists per tracked target. It turns the tracker's noisy
//! found/lost stream into play/pause decisions for a single media element:
//! a `found` resumes playback right away, a `lost` only pauses once the
//! target has stayed lost for the whole grace period. A `found` arriving
//! inside that window cancels the pause outright.
//!
//! The controller owns at most one pending deactivation timer. Once spawned
//! with [`DebounceController::run`] it is driven by a single task, so signals
//! and the timer are handled strictly one after another and a cancelled
//! timer can never fire.

use std::future::pending;
use std::pin::Pin;
use std::time::Duration;

use futures::StreamExt;
use log::{debug, info, warn};
use tokio::select;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant, Sleep};

use crate::definitions::{TargetConfig, TargetIndex, TrackingEvent, DEFAULT_GRACE_PERIOD_MS};
use crate::media::{MediaError, MediaPlayer, MediaPlayerInterface};
use crate::tracking::TrackingSubscription;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ControllerState {
    /// Media is not supposed to play.
    #[default]
    Idle,
    /// Target is visible and media is supposed to play.
    Active,
    /// Target was lost; a deactivation is armed.
    PendingIdle,
}

/// Lifetime counters of the deactivation timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeactivationStats {
    pub armed: u64,
    pub cancelled: u64,
    pub fired: u64,
}

impl DeactivationStats {
    /// Number of timers currently armed. Never exceeds one.
    pub fn pending(&self) -> u64 {
        self.armed.saturating_sub(self.cancelled + self.fired)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSnapshot {
    pub target: TargetIndex,
    pub state: ControllerState,
    pub stats: DeactivationStats,
}

pub struct DebounceController {
    target: TargetIndex,
    media: MediaPlayer,
    grace_period: Duration,
    pending_deactivation: Option<Pin<Box<Sleep>>>,
    state: ControllerState,
    stats: DeactivationStats,
}

impl DebounceController {
    pub fn new(target: TargetIndex, media: MediaPlayer, grace_period: Duration) -> Self {
        Self {
            target,
            media,
            grace_period,
            pending_deactivation: None,
            state: ControllerState::Idle,
            stats: DeactivationStats::default(),
        }
    }

    /// Controller with the default 500 ms grace period.
    pub fn with_default_grace(target: TargetIndex, media: MediaPlayer) -> Self {
        Self::new(target, media, Duration::from_millis(DEFAULT_GRACE_PERIOD_MS))
    }

    pub fn with_config(target: TargetIndex, media: MediaPlayer, config: &TargetConfig) -> Self {
        Self::new(target, media, config.grace_period)
    }

    pub fn target(&self) -> TargetIndex {
        self.target
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn stats(&self) -> DeactivationStats {
        self.stats
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            target: self.target,
            state: self.state,
            stats: self.stats,
        }
    }

    pub fn has_pending_deactivation(&self) -> bool {
        self.pending_deactivation.is_some()
    }

    pub fn deactivation_deadline(&self) -> Option<Instant> {
        self.pending_deactivation.as_ref().map(|timer| timer.deadline())
    }

    pub async fn on_target_found(&mut self) {
        if self.cancel_pending_deactivation() {
            debug!("Target {}: found within grace period, pause cancelled", self.target);
        }
        self.state = ControllerState::Active;

        if let Err(e) = self.media.set_muted(false).await {
            warn!("Target {}: failed to unmute media: {}", self.target, e);
        }

        match self.media.is_paused().await {
            Ok(true) => self.start_playback().await,
            Ok(false) => debug!("Target {}: media already playing", self.target),
            Err(e) => warn!("Target {}: cannot read playback state: {}", self.target, e),
        }
    }

    pub async fn on_target_lost(&mut self) {
        match self.state {
            ControllerState::PendingIdle => {
                debug!("Target {}: lost again, deactivation already pending", self.target);
            }
            ControllerState::Idle => {
                debug!("Target {}: lost while inactive, ignoring", self.target);
            }
            ControllerState::Active if self.grace_period.is_zero() => {
                self.fire_deactivation().await;
                self.stats.armed += 1;
            }
            ControllerState::Active => {
                debug!("Target {}: lost, pausing in {:?} unless found", self.target, self.grace_period);
                self.pending_deactivation = Some(Box::pin(sleep(self.grace_period)));
                self.stats.armed += 1;
                self.state = ControllerState::PendingIdle;
            }
        }
    }

    /// Cancels a pending deactivation. Media keeps whatever state it has.
    pub fn dispose(&mut self) {
        if self.cancel_pending_deactivation() {
            debug!("Target {}: pending pause cancelled on dispose", self.target);
        }
    }

    /// Waits for the armed deactivation and applies it. Returns `false` right
    /// away when nothing is armed.
    ///
    /// Cancel safe: if the future is dropped before the media confirmed the
    /// pause, the deactivation stays armed and the next call applies it.
    pub async fn run_pending_deactivation(&mut self) -> bool {
        let Some(timer) = self.pending_deactivation.as_mut() else {
            return false;
        };
        timer.as_mut().await;
        self.fire_deactivation().await;
        true
    }

    /// Spawns the controller loop fed by `signals` and returns its handle.
    pub fn run(mut self, mut signals: TrackingSubscription) -> ControllerHandle {
        let target = self.target;
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let (state_tx, state_rx) = watch::channel(self.snapshot());

        let join = tokio::spawn(async move {
            info!("Debounce controller of target {} started (grace {:?})", target, self.grace_period);
            loop {
                select! {
                    biased;
                    _ = &mut shutdown_rx => {
                        info!("Debounce controller of target {} shutdown requested", target);
                        break;
                    }
                    _ = deactivation_due(&mut self.pending_deactivation) => {
                        self.fire_deactivation().await;
                    }
                    signal = signals.next() => {
                        match signal {
                            Some(TrackingEvent::Found) => self.on_target_found().await,
                            Some(TrackingEvent::Lost) => self.on_target_lost().await,
                            None => {
                                info!("Signal stream of target {} closed", target);
                                break;
                            }
                        }
                    }
                }
                state_tx.send_replace(self.snapshot());
            }
            signals.detach();
            self.dispose();
            state_tx.send_replace(self.snapshot());
        });

        ControllerHandle {
            target,
            join,
            shutdown_tx,
            state_rx,
        }
    }

    async fn start_playback(&mut self) {
        match self.media.play().await {
            Ok(()) => debug!("Target {}: playback started", self.target),
            Err(MediaError::PlaybackBlocked(reason)) => {
                warn!("Target {}: autoplay blocked: {}", self.target, reason);
            }
            Err(e) => warn!("Target {}: failed to start playback: {}", self.target, e),
        }
    }

    async fn fire_deactivation(&mut self) {
        match self.media.pause().await {
            Ok(()) => debug!("Target {}: media paused", self.target),
            Err(e) => warn!("Target {}: failed to pause media: {}", self.target, e),
        }
        // committed only after pause() returned
        self.pending_deactivation = None;
        self.stats.fired += 1;
        self.state = ControllerState::Idle;
    }

    fn cancel_pending_deactivation(&mut self) -> bool {
        if self.pending_deactivation.take().is_none() {
            return false;
        }
        self.stats.cancelled += 1;
        // the pause never happened, so the media is still meant to play
        self.state = ControllerState::Active;
        true
    }
}

async fn deactivation_due(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(timer) => timer.as_mut().await,
        None => pending::<()>().await,
    }
}

/// Handle to a spawned controller loop.
pub struct ControllerHandle {
    target: TargetIndex,
    join: JoinHandle<()>,
    shutdown_tx: oneshot::Sender<()>,
    state_rx: watch::Receiver<ControllerSnapshot>,
}

impl ControllerHandle {
    pub fn target(&self) -> TargetIndex {
        self.target
    }

    /// State published after the last processed signal or timer.
    pub fn snapshot(&self) -> ControllerSnapshot {
        *self.state_rx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ControllerSnapshot> {
        self.state_rx.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Stops the loop, cancelling any pending deactivation.
    pub async fn shutdown(self) -> Result<(), tokio::task::JoinError> {
        let _ = self.shutdown_tx.send(());
        self.join.await
    }

    pub fn abort(self) {
        self.join.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaState;
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc::UnboundedSender;
    use tokio::time::sleep_until;

    #[derive(Debug, Default)]
    struct MockState {
        playing: bool,
        muted: bool,
        block_autoplay: bool,
        play_calls: u32,
        play_while_playing: u32,
        pause_calls: u32,
        pause_delay: Duration,
    }

    #[derive(Default)]
    struct MockMedia {
        state: Mutex<MockState>,
    }

    impl MockMedia {
        fn new() -> Arc<Self> {
            let media = Self::default();
            media.state.lock().unwrap().muted = true;
            Arc::new(media)
        }
        fn blocking() -> Arc<Self> {
            let media = Self::new();
            media.state.lock().unwrap().block_autoplay = true;
            media
        }
        fn set_block_autoplay(&self, block: bool) {
            self.state.lock().unwrap().block_autoplay = block;
        }
        fn playing(&self) -> bool { self.state.lock().unwrap().playing }
        fn muted(&self) -> bool { self.state.lock().unwrap().muted }
        fn play_calls(&self) -> u32 { self.state.lock().unwrap().play_calls }
        fn pause_calls(&self) -> u32 { self.state.lock().unwrap().pause_calls }
        fn play_while_playing(&self) -> u32 { self.state.lock().unwrap().play_while_playing }
    }

    #[async_trait]
    impl MediaPlayerInterface for MockMedia {
        async fn get_current_state(&self) -> Result<MediaState, MediaError> {
            let s = self.state.lock().unwrap();
            Ok(MediaState { paused: !s.playing, muted: s.muted, looping: true })
        }
        async fn play(&self) -> Result<(), MediaError> {
            let mut s = self.state.lock().unwrap();
            s.play_calls += 1;
            if s.playing {
                s.play_while_playing += 1;
            }
            if s.block_autoplay {
                return Err(MediaError::PlaybackBlocked("NotAllowedError".into()));
            }
            s.playing = true;
            Ok(())
        }
        async fn pause(&self) -> Result<(), MediaError> {
            let delay = self.state.lock().unwrap().pause_delay;
            if !delay.is_zero() {
                sleep(delay).await;
            }
            let mut s = self.state.lock().unwrap();
            s.pause_calls += 1;
            s.playing = false;
            Ok(())
        }
        async fn set_muted(&self, muted: bool) -> Result<(), MediaError> {
            self.state.lock().unwrap().muted = muted;
            Ok(())
        }
    }

    fn ms(n: u64) -> Duration { Duration::from_millis(n) }

    fn controller(media: &Arc<MockMedia>, grace: Duration) -> DebounceController {
        DebounceController::new(TargetIndex(0), MediaPlayer::new(media.clone()), grace)
    }

    fn spawn_controller(media: &Arc<MockMedia>, grace: Duration)
        -> (UnboundedSender<TrackingEvent>, ControllerHandle) {
        let (tx, subscription) = TrackingSubscription::channel(TargetIndex(0));
        (tx, controller(media, grace).run(subscription))
    }

    #[tokio::test(start_paused = true)]
    async fn starts_idle_with_nothing_armed() {
        let media = MockMedia::new();
        let ctrl = DebounceController::with_default_grace(TargetIndex(4), MediaPlayer::new(media.clone()));
        assert_eq!(ctrl.state(), ControllerState::Idle);
        assert_eq!(ctrl.stats(), DeactivationStats::default());
        assert_eq!(ctrl.grace_period(), ms(500));
        assert!(!ctrl.has_pending_deactivation());
        assert_eq!(media.play_calls(), 0);
    }

    #[test]
    fn target_config_defaults_to_500ms() {
        let config = TargetConfig::new("#video-0");
        assert_eq!(config.grace_period, ms(500));
        assert_eq!(config.media_selector, "#video-0");
    }

    #[tokio::test(start_paused = true)]
    async fn found_plays_unmuted() {
        let media = MockMedia::new();
        let mut ctrl = controller(&media, ms(500));
        ctrl.on_target_found().await;
        assert!(media.playing());
        assert!(!media.muted());
        assert_eq!(ctrl.state(), ControllerState::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_found_plays_once() {
        let media = MockMedia::new();
        let mut ctrl = controller(&media, ms(500));
        ctrl.on_target_found().await;
        ctrl.on_target_found().await;
        assert_eq!(media.play_calls(), 1);
        assert_eq!(media.play_while_playing(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_lost_arms_a_single_timer() {
        let media = MockMedia::new();
        let mut ctrl = controller(&media, ms(500));
        ctrl.on_target_found().await;
        let lost_at = Instant::now();
        ctrl.on_target_lost().await;
        ctrl.on_target_lost().await;
        ctrl.on_target_lost().await;
        assert_eq!(ctrl.state(), ControllerState::PendingIdle);
        assert_eq!(ctrl.stats().armed, 1);
        assert_eq!(ctrl.stats().pending(), 1);
        assert_eq!(ctrl.deactivation_deadline(), Some(lost_at + ms(500)));
    }

    #[tokio::test(start_paused = true)]
    async fn found_within_grace_cancels_pause() {
        let media = MockMedia::new();
        let mut ctrl = controller(&media, ms(500));
        ctrl.on_target_found().await;
        ctrl.on_target_lost().await;
        tokio::time::advance(ms(200)).await;
        ctrl.on_target_found().await;

        assert!(!ctrl.has_pending_deactivation());
        assert_eq!(ctrl.state(), ControllerState::Active);
        assert_eq!(ctrl.stats().cancelled, 1);

        tokio::time::advance(ms(1000)).await;
        assert!(!ctrl.run_pending_deactivation().await);
        assert_eq!(media.pause_calls(), 0);
        assert!(media.playing());
        assert_eq!(media.play_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn lost_without_found_pauses_after_grace() {
        let media = MockMedia::new();
        let mut ctrl = controller(&media, ms(500));
        ctrl.on_target_found().await;
        let lost_at = Instant::now();
        ctrl.on_target_lost().await;

        assert!(ctrl.run_pending_deactivation().await);
        assert!(Instant::now() - lost_at >= ms(500));
        assert_eq!(media.pause_calls(), 1);
        assert!(!media.playing());
        assert_eq!(ctrl.state(), ControllerState::Idle);
        assert_eq!(ctrl.stats(), DeactivationStats { armed: 1, cancelled: 0, fired: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn interrupted_deactivation_stays_armed() {
        let media = MockMedia::new();
        media.state.lock().unwrap().pause_delay = ms(50);
        let mut ctrl = controller(&media, ms(500));
        ctrl.on_target_found().await;
        ctrl.on_target_lost().await;

        let interrupted = tokio::time::timeout(ms(520), ctrl.run_pending_deactivation()).await;
        assert!(interrupted.is_err());
        assert_eq!(ctrl.state(), ControllerState::PendingIdle);
        assert!(ctrl.has_pending_deactivation());
        assert_eq!(ctrl.stats().fired, 0);
        assert!(media.playing());

        assert!(ctrl.run_pending_deactivation().await);
        assert_eq!(ctrl.state(), ControllerState::Idle);
        assert_eq!(ctrl.stats(), DeactivationStats { armed: 1, cancelled: 0, fired: 1 });
        assert_eq!(media.pause_calls(), 1);
        assert!(!media.playing());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_grace_pauses_immediately() {
        let media = MockMedia::new();
        let mut ctrl = controller(&media, Duration::ZERO);
        ctrl.on_target_found().await;
        ctrl.on_target_lost().await;
        assert_eq!(media.pause_calls(), 1);
        assert!(!ctrl.has_pending_deactivation());
        assert_eq!(ctrl.state(), ControllerState::Idle);
        assert_eq!(ctrl.stats().pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn lost_while_idle_is_harmless() {
        let media = MockMedia::new();
        let mut ctrl = controller(&media, ms(500));
        ctrl.on_target_lost().await;
        assert_eq!(ctrl.state(), ControllerState::Idle);
        assert!(!ctrl.has_pending_deactivation());
        assert_eq!(media.pause_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn blocked_autoplay_is_retried_on_next_found() {
        let media = MockMedia::blocking();
        let mut ctrl = controller(&media, ms(500));
        ctrl.on_target_found().await;
        assert_eq!(ctrl.state(), ControllerState::Active);
        assert!(!media.playing());
        assert!(!media.muted());

        media.set_block_autoplay(false);
        ctrl.on_target_found().await;
        assert!(media.playing());
        assert_eq!(media.play_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_cancels_pending_deactivation() {
        let media = MockMedia::new();
        let mut ctrl = controller(&media, ms(500));
        ctrl.on_target_found().await;
        ctrl.on_target_lost().await;
        ctrl.dispose();
        assert!(!ctrl.has_pending_deactivation());
        assert_eq!(ctrl.stats().cancelled, 1);
        tokio::time::advance(ms(1000)).await;
        assert_eq!(media.pause_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn flicker_inside_grace_never_pauses() {
        let media = MockMedia::new();
        let (tx, handle) = spawn_controller(&media, ms(500));
        let start = Instant::now();

        tx.send(TrackingEvent::Found).unwrap();
        sleep_until(start + ms(100)).await;
        assert!(media.playing());
        assert!(!media.muted());

        tx.send(TrackingEvent::Lost).unwrap();
        sleep_until(start + ms(200)).await;
        assert_eq!(handle.snapshot().state, ControllerState::PendingIdle);

        tx.send(TrackingEvent::Found).unwrap();
        sleep_until(start + ms(1500)).await;
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.state, ControllerState::Active);
        assert_eq!(snapshot.stats, DeactivationStats { armed: 1, cancelled: 1, fired: 0 });
        assert_eq!(media.pause_calls(), 0);
        assert_eq!(media.play_calls(), 1);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn pause_lands_between_499_and_501ms() {
        let media = MockMedia::new();
        let (tx, handle) = spawn_controller(&media, ms(500));

        tx.send(TrackingEvent::Found).unwrap();
        sleep(ms(10)).await;
        let lost_at = Instant::now();
        tx.send(TrackingEvent::Lost).unwrap();

        sleep_until(lost_at + ms(499)).await;
        assert!(media.playing());
        assert_eq!(handle.snapshot().state, ControllerState::PendingIdle);

        sleep_until(lost_at + ms(501)).await;
        assert!(!media.playing());
        assert_eq!(media.pause_calls(), 1);
        assert_eq!(handle.snapshot().state, ControllerState::Idle);

        sleep(ms(2000)).await;
        assert_eq!(media.pause_calls(), 1);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_mid_grace_cancels_pause() {
        let media = MockMedia::new();
        let (tx, handle) = spawn_controller(&media, ms(500));
        tx.send(TrackingEvent::Found).unwrap();
        sleep(ms(10)).await;
        tx.send(TrackingEvent::Lost).unwrap();
        sleep(ms(100)).await;

        let mut snapshots = handle.subscribe();
        handle.shutdown().await.unwrap();
        let last = *snapshots.borrow_and_update();
        assert_eq!(last.stats.pending(), 0);
        assert_eq!(last.stats.cancelled, 1);

        sleep(ms(1000)).await;
        assert_eq!(media.pause_calls(), 0);
        assert!(media.playing());
        assert!(tx.send(TrackingEvent::Found).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn closed_signal_stream_stops_the_loop() {
        let media = MockMedia::new();
        let (tx, handle) = spawn_controller(&media, ms(500));
        drop(tx);
        sleep(ms(1)).await;
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn randomized_signals_keep_at_most_one_timer() {
        let mut rng = StdRng::seed_from_u64(0x7A46E7_u64);
        for round in 0..16 {
            let media = MockMedia::new();
            let grace = ms(rng.random_range(0..=600));
            let mut ctrl = controller(&media, grace);

            for _ in 0..200 {
                match rng.random_range(0..3) {
                    0 => ctrl.on_target_found().await,
                    1 => ctrl.on_target_lost().await,
                    _ => {
                        let wait = ms(rng.random_range(0..800));
                        let _ = tokio::time::timeout(wait, ctrl.run_pending_deactivation()).await;
                    }
                }
                let stats = ctrl.stats();
                assert!(stats.pending() <= 1, "round {round}: {stats:?}");
                assert_eq!(stats.armed, stats.cancelled + stats.fired + stats.pending());
                assert_eq!(ctrl.has_pending_deactivation(), stats.pending() == 1);
                assert_eq!(ctrl.state() == ControllerState::PendingIdle, ctrl.has_pending_deactivation());
                assert_eq!(u64::from(media.pause_calls()), stats.fired);
                assert_eq!(media.play_while_playing(), 0);
            }
        }
    }
}
