// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session lifecycle management for the Sokoni agent service.
//!
//! One live session per agent: pairing (QR or linking code), credential
//! persistence, reconnect-on-transient-failure, inbound normalization,
//! and outbound send primitives.

pub mod credentials;
pub mod normalize;
pub mod qr;
pub mod registry;

pub use registry::{PairingOptions, SessionRegistry, TransportFactory};
