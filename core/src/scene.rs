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

use thiserror::Error;

use crate::definitions::TargetIndex;
use crate::media::MediaPlayer;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum SceneError {
    #[error("Scene node {0} already exists")]
    DuplicateNode(String),
    #[error("Scene builder error: {0}")]
    Other(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Preload {
    None,
    Metadata,
    #[default]
    Auto,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CrossOrigin {
    #[default]
    Anonymous,
    UseCredentials,
}

/// Declared media asset backing one overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaAssetNode {
    pub id: String,
    pub source: String,
    pub preload: Preload,
    pub looping: bool,
    pub plays_inline: bool,
    pub cross_origin: CrossOrigin,
}

impl MediaAssetNode {
    pub fn for_target(index: TargetIndex, source: impl Into<String>) -> Self {
        Self {
            id: media_asset_id(index),
            source: source.into(),
            preload: Preload::Auto,
            looping: true,
            plays_inline: true,
            cross_origin: CrossOrigin::Anonymous,
        }
    }

    pub fn selector(&self) -> String {
        format!("#{}", self.id)
    }
}

/// Plane the media is rendered on, in target-local units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayPlane {
    pub width: f64,
    pub height: f64,
    pub position: [f64; 3],
}

impl OverlayPlane {
    pub fn unit_width(aspect_height: f64) -> Self {
        Self {
            width: 1.0,
            height: aspect_height,
            position: [0.0, 0.0, 0.0],
        }
    }
}

/// Anchor node following one tracked target.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetNode {
    pub target_index: TargetIndex,
    pub media_selector: String,
    pub overlay: OverlayPlane,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNodes {
    pub asset: MediaAssetNode,
    pub target: TargetNode,
}

impl SceneNodes {
    pub fn new(index: TargetIndex, media_source: &str, aspect_height: f64) -> Self {
        let asset = MediaAssetNode::for_target(index, media_source);
        let target = TargetNode {
            target_index: index,
            media_selector: asset.selector(),
            overlay: OverlayPlane::unit_width(aspect_height),
        };
        Self { asset, target }
    }
}

pub fn media_asset_id(index: TargetIndex) -> String {
    format!("video-{}", index.0)
}

pub fn media_selector(index: TargetIndex) -> String {
    format!("#{}", media_asset_id(index))
}

/// Renderer-side collaborator that materializes overlay nodes.
pub trait SceneBuilder: Send + Sync {
    /// Creates the media asset and target nodes of one content entry.
    fn add_target(&self, index: TargetIndex, media_source: &str, aspect_height: f64)
        -> Result<SceneNodes, SceneError>;

    /// Resolves a media selector produced by [`SceneBuilder::add_target`].
    fn locate_media(&self, selector: &str) -> Option<MediaPlayer>;

    /// Drops the nodes of `index`. Unknown targets are ignored.
    fn remove_target(&self, index: TargetIndex);
}
