// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Sokoni commerce-agent service.
//!
//! TOML files merged through the XDG hierarchy with `SOKONI_*` environment
//! variable overrides.

pub mod loader;
pub mod model;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    BridgeConfig, CreditsConfig, OpenAiConfig, PipelineConfig, ServiceConfig, SessionConfig,
    SokoniConfig, StorageConfig,
};
