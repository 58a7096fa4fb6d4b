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
use std::sync::{Arc, Mutex};

use log::info;
use overlay_core::media::MediaPlayer;
use overlay_core::definitions::TargetIndex;
use overlay_core::scene::{media_selector, SceneBuilder, SceneError, SceneNodes};

use crate::media::{AutoplayPolicy, SimulatedMediaPlayer};

/// Scene graph kept in memory; each target gets a simulated media element.
pub struct SimulatedScene {
    policy: Arc<AutoplayPolicy>,
    nodes: Mutex<Vec<SceneNodes>>,
    media: Mutex<HashMap<String, Arc<SimulatedMediaPlayer>>>,
}

impl SimulatedScene {
    pub fn new(policy: Arc<AutoplayPolicy>) -> Self {
        Self {
            policy,
            nodes: Mutex::new(Vec::new()),
            media: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &Arc<AutoplayPolicy> {
        &self.policy
    }

    pub fn nodes(&self) -> Vec<SceneNodes> {
        self.nodes.lock().unwrap().clone()
    }

    /// Inspection access for diagnostics; the controllers hold their own handles.
    pub fn media(&self, selector: &str) -> Option<Arc<SimulatedMediaPlayer>> {
        self.media.lock().unwrap().get(selector).cloned()
    }
}

impl SceneBuilder for SimulatedScene {
    fn add_target(&self, index: TargetIndex, media_source: &str, aspect_height: f64)
        -> Result<SceneNodes, SceneError> {
        let nodes = SceneNodes::new(index, media_source, aspect_height);
        let selector = nodes.asset.selector();

        let mut media = self.media.lock().unwrap();
        if media.contains_key(&selector) {
            return Err(SceneError::DuplicateNode(nodes.asset.id.clone()));
        }
        media.insert(selector, Arc::new(SimulatedMediaPlayer::new(media_source, self.policy.clone())));
        self.nodes.lock().unwrap().push(nodes.clone());

        info!("Scene: target {} overlays {} (1 x {})", index, media_source, aspect_height);
        Ok(nodes)
    }

    fn locate_media(&self, selector: &str) -> Option<MediaPlayer> {
        self.media(selector).map(|media| MediaPlayer::new(media))
    }

    fn remove_target(&self, index: TargetIndex) {
        if self.media.lock().unwrap().remove(&media_selector(index)).is_none() {
            return;
        }
        self.nodes.lock().unwrap().retain(|nodes| nodes.target.target_index != index);
        info!("Scene: target {} removed", index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_target_registers_locatable_media() {
        let scene = SimulatedScene::new(Arc::new(AutoplayPolicy::default()));
        let nodes = scene.add_target(TargetIndex(0), "a.mp4", 0.5).unwrap();
        assert!(scene.locate_media(&nodes.target.media_selector).is_some());
        assert_eq!(scene.media("#video-0").unwrap().source(), "a.mp4");
        assert_eq!(scene.nodes(), vec![nodes]);
        assert!(scene.locate_media("#video-9").is_none());
    }

    #[test]
    fn removed_target_can_be_added_again() {
        let scene = SimulatedScene::new(Arc::new(AutoplayPolicy::default()));
        scene.add_target(TargetIndex(0), "a.mp4", 0.5).unwrap();
        scene.add_target(TargetIndex(1), "b.mp4", 0.5).unwrap();

        scene.remove_target(TargetIndex(0));
        scene.remove_target(TargetIndex(7));
        assert!(scene.media("#video-0").is_none());
        assert_eq!(scene.nodes().len(), 1);

        let nodes = scene.add_target(TargetIndex(0), "c.mp4", 0.5).unwrap();
        assert_eq!(scene.media(&nodes.target.media_selector).unwrap().source(), "c.mp4");
    }

    #[test]
    fn duplicate_target_is_rejected() {
        let scene = SimulatedScene::new(Arc::new(AutoplayPolicy::default()));
        scene.add_target(TargetIndex(1), "a.mp4", 0.5).unwrap();
        assert_eq!(
            scene.add_target(TargetIndex(1), "b.mp4", 0.5),
            Err(SceneError::DuplicateNode("video-1".into()))
        );
    }
}
