// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Sokoni conversational-commerce agent service.
//!
//! This crate provides the trait definitions, error type, and domain
//! types shared by every other workspace crate. Transport, storage, AI,
//! and speech backends all implement traits defined here.

pub mod error;
pub mod phone;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::SokoniError;
pub use phone::normalize_phone;
pub use types::{
    Agent, Booking, Conversation, CreditBalance, DeliveryStatus, HistoryMessage, LeadAnalysis,
    MessageKind, MessageRecord, MessageRole, NormalizedMessage, Order, OrderItem, OrderStatus,
    PaymentMethod, PaymentMode, Product, ProductType, ResponderReply, ResponderRequest,
    SessionSnapshot, SessionStatus, ToolCall, ToolFunction, ToolResult, VariantGroup,
    VariantOption, VariantPricing,
};

pub use traits::{
    ChatTransport, InboundHandler, Presence, RawInbound, RawPayload, Responder, SpeechService,
    Store, TransportEvent,
};
