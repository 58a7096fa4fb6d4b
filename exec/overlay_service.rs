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

mod cli;
mod commands;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use log::{error, info, warn};
use overlay_core::camera::CameraSession;
use overlay_core::status::StatusBoard;
use overlay_core::{ChannelTrackingSource, OverlayConfig, OverlayService};
use overlay_simulated_port::{initialize_simulated_platform, SimulatedPlatform};
use tokio::io::{AsyncBufReadExt, BufReader};

use cli::Cli;
use commands::{Command, HELP};

fn print_status(service: &OverlayService, platform: &SimulatedPlatform, status: &StatusBoard) {
    let camera = service.camera().status();
    println!(
        "camera: active={} stream={} ({})",
        camera.active,
        camera.has_stream,
        status.latest().unwrap_or_default()
    );
    let Some(registry) = service.registry() else {
        println!("no targets bound");
        return;
    };
    for binding in registry.iter() {
        let snapshot = binding.snapshot();
        let media = platform.scene.media(&binding.config.media_selector).map(|m| m.state());
        println!(
            "target {}: {:?} pending={} media={:?}",
            binding.index,
            snapshot.state,
            snapshot.stats.pending(),
            media
        );
    }
    for failure in service.binding_failures() {
        println!("target {}: not bound ({})", failure.target(), failure);
    }
}

async fn run_console(
    service: &OverlayService,
    tracker: &ChannelTrackingSource,
    platform: &SimulatedPlatform,
    status: &StatusBoard,
) -> anyhow::Result<()> {
    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received");
                None
            }
        };
        let Some(line) = line else {
            return Ok(());
        };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(Command::Signal(target, event)) => {
                if let Err(e) = tracker.emit(target, event) {
                    warn!("{}", e);
                }
            }
            Ok(Command::Tap) => platform.autoplay.grant_user_activation(),
            Ok(Command::Status) => print_status(service, platform, status),
            Ok(Command::Quit) => return Ok(()),
            Err(e) => println!("{} ({})", e, HELP),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.log_level.to_level_filter())
        .parse_default_env()
        .init();

    let mut config = match &cli.config {
        Some(path) => OverlayConfig::load(path)?,
        None => OverlayConfig::default(),
    };
    if let Some(grace_period_ms) = cli.grace_period_ms {
        config.grace_period_ms = grace_period_ms;
    }

    let platform = initialize_simulated_platform(cli.camera_permission.into(), cli.user_activated);
    let status = Arc::new(StatusBoard::new());
    let camera = CameraSession::new(platform.camera.clone(), config.camera.clone(), status.clone());
    let tracker = Arc::new(ChannelTrackingSource::new());
    let mut service = OverlayService::new(camera);

    if let Err(e) = service.start(&config, platform.scene.clone(), tracker.clone()).await {
        error!("Overlay service failed to start: {}", e);
        println!("{}", status.latest().unwrap_or_else(|| e.to_string()));
        return Err(e.into());
    }

    let result = run_console(&service, &tracker, &platform, &status).await;
    service.stop().await;
    println!("Exiting...");
    result
}
