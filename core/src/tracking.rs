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

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll};

use futures::Stream;
use log::debug;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::definitions::{TargetIndex, TrackingEvent};

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum TrackingError {
    #[error("Target {0} already has a listener")]
    AlreadySubscribed(TargetIndex),
    #[error("Target {0} has no listener")]
    NoListener(TargetIndex),
}

/// Source of found/lost signals, one serial stream per target.
///
/// Implementations wrap whatever tracking engine is in use. Events for a
/// given target must be delivered in the order they were emitted.
pub trait TrackingSignalSource: Send + Sync {
    /// Registers the single listener of `target`.
    fn subscribe(&self, target: TargetIndex) -> Result<TrackingSubscription, TrackingError>;

    /// Drops the listener of `target`, ending its subscription stream.
    fn unsubscribe(&self, target: TargetIndex);
}

/// Receiving end of one target's signal stream.
pub struct TrackingSubscription {
    target: TargetIndex,
    receiver: mpsc::UnboundedReceiver<TrackingEvent>,
}

impl TrackingSubscription {
    pub fn new(target: TargetIndex, receiver: mpsc::UnboundedReceiver<TrackingEvent>) -> Self {
        Self { target, receiver }
    }

    /// Creates a subscription together with the sender feeding it.
    pub fn channel(target: TargetIndex) -> (mpsc::UnboundedSender<TrackingEvent>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(target, rx))
    }

    pub fn target(&self) -> TargetIndex {
        self.target
    }

    pub async fn recv(&mut self) -> Option<TrackingEvent> {
        self.receiver.recv().await
    }

    /// Stops accepting new signals. Already queued signals are discarded by
    /// the owner dropping the subscription.
    pub fn detach(&mut self) {
        self.receiver.close();
    }
}

impl Stream for TrackingSubscription {
    type Item = TrackingEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}

/// Tracking source fed programmatically, e.g. by a tracker bridge or tests.
#[derive(Default)]
pub struct ChannelTrackingSource {
    listeners: Mutex<HashMap<TargetIndex, mpsc::UnboundedSender<TrackingEvent>>>,
}

impl ChannelTrackingSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `event` to the listener of `target` without blocking.
    pub fn emit(&self, target: TargetIndex, event: TrackingEvent) -> Result<(), TrackingError> {
        let mut listeners = self.listeners.lock().unwrap();
        let Some(sender) = listeners.get(&target) else {
            return Err(TrackingError::NoListener(target));
        };
        if sender.send(event).is_err() {
            debug!("Listener of target {} is gone, dropping it", target);
            listeners.remove(&target);
            return Err(TrackingError::NoListener(target));
        }
        Ok(())
    }

    pub fn is_subscribed(&self, target: TargetIndex) -> bool {
        self.listeners
            .lock()
            .unwrap()
            .get(&target)
            .is_some_and(|sender| !sender.is_closed())
    }

    pub fn subscribed_targets(&self) -> Vec<TargetIndex> {
        let mut targets: Vec<_> = self
            .listeners
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, sender)| !sender.is_closed())
            .map(|(target, _)| *target)
            .collect();
        targets.sort();
        targets
    }
}

impl TrackingSignalSource for ChannelTrackingSource {
    fn subscribe(&self, target: TargetIndex) -> Result<TrackingSubscription, TrackingError> {
        let mut listeners = self.listeners.lock().unwrap();
        if listeners.get(&target).is_some_and(|sender| !sender.is_closed()) {
            return Err(TrackingError::AlreadySubscribed(target));
        }
        let (tx, subscription) = TrackingSubscription::channel(target);
        listeners.insert(target, tx);
        debug!("Target {} subscribed", target);
        Ok(subscription)
    }

    fn unsubscribe(&self, target: TargetIndex) {
        if self.listeners.lock().unwrap().remove(&target).is_some() {
            debug!("Target {} unsubscribed", target);
        }
    }
}
