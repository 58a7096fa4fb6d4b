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

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::LevelFilter;
use overlay_simulated_port::CameraPermission;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PermissionArg {
    Granted,
    Denied,
    NoDevice,
    Unsupported,
}

impl From<PermissionArg> for CameraPermission {
    fn from(value: PermissionArg) -> Self {
        match value {
            PermissionArg::Granted => CameraPermission::Granted,
            PermissionArg::Denied => CameraPermission::Denied,
            PermissionArg::NoDevice => CameraPermission::NoDevice,
            PermissionArg::Unsupported => CameraPermission::Unsupported,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Set the log level
    #[arg(short, long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// JSON configuration file; built-in content is used when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the grace period of every target without its own value
    #[arg(short, long)]
    pub grace_period_ms: Option<u64>,

    /// Answer of the simulated camera to the access request
    #[arg(long, value_enum, default_value_t = PermissionArg::Granted)]
    pub camera_permission: PermissionArg,

    /// Start as if the user already interacted with the page
    #[arg(long)]
    pub user_activated: bool,
}
