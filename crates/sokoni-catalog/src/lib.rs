// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure catalog resolution: fuzzy product lookup, flexible variant
//! matching, and per-item pricing. No I/O; the tool executor feeds it
//! the product list and interprets its outcomes.

pub mod matcher;
pub mod resolver;

pub use matcher::{find_product, find_product_by_name};
pub use resolver::{
    find_matching_option, product_image, resolve_item, MissingVariant, ResolutionFailure,
    ResolvedItem,
};
