//! Copyright © 2025 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Liu.
//! The Liu project belongs to the Dunimd project team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! Backend for the `log` facade used throughout the crate.
//!
//! Library code only calls `log::info!` and friends; binaries call
//! [`init`] once to route those lines to the console and an optional file.

pub mod config;
pub mod context;
pub mod core;
pub mod formatters;
pub mod handlers;

pub use self::config::{LiuLogConfig, LiuLogConfigBuilder};
pub use self::context::{LiuLogContext, LiuLogContextGuard};
pub use self::core::{LiuLogLine, LiuLogger};
pub use self::formatters::{LiuJsonFormatter, LiuTextFormatter};
pub use self::handlers::{LiuConsoleHandler, LiuFileHandler, LiuLogHandler};

/// Installs the global logger.
pub fn init(config: LiuLogConfig) -> crate::errors::Result<()> {
    LiuLogger::init(config)
}
