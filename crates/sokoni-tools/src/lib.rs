// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AI tool layer: function-calling schemas and the executor that turns
//! tool calls into orders, bookings, status lookups, and image sends.

pub mod bookings;
pub mod executor;
pub mod orders;
pub mod schemas;

pub use executor::{ToolContext, ToolExecutor};
pub use schemas::tool_definitions;
