// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fuzzy product lookup.
//!
//! AI-generated product names rarely match the catalog verbatim, so
//! lookup is scored: exact name match wins outright, substring
//! containment in either direction is a strong signal, and token
//! overlap is the last resort. A description-token phase only kicks in
//! when the name overlap is weak, keeping short generic words in
//! descriptions from hijacking the match.

use sokoni_core::Product;

const ACCEPT_THRESHOLD: u32 = 10;

fn score(query_lower: &str, terms: &[&str], product: &Product) -> u32 {
    let name_lower = product.name.to_lowercase();
    if name_lower == query_lower {
        return 100;
    }
    if query_lower.contains(&name_lower) || name_lower.contains(query_lower) {
        return 50;
    }
    let name_hits = terms.iter().filter(|t| name_lower.contains(**t)).count() as u32;
    let mut score = name_hits * 10;
    if score < 20 {
        let full_text = format!(
            "{} {} {}",
            product.name,
            product.description.as_deref().unwrap_or(""),
            product.ai_instructions.as_deref().unwrap_or("")
        )
        .to_lowercase();
        let text_hits = terms.iter().filter(|t| full_text.contains(**t)).count() as u32;
        score += text_hits * 2;
    }
    score
}

/// Best-scoring product for `query`, or `None` when nothing reaches the
/// acceptance threshold. Ties keep the earlier product.
pub fn find_product<'a>(query: &str, products: &'a [Product]) -> Option<&'a Product> {
    let query_lower = query.to_lowercase();
    // Words of three letters or fewer are too generic to score on.
    let terms: Vec<&str> = query_lower
        .split_whitespace()
        .filter(|w| w.len() > 2)
        .collect();

    let mut best: Option<&Product> = None;
    let mut best_score = 0;
    for product in products {
        let s = score(&query_lower, &terms, product);
        if s > best_score {
            best_score = s;
            best = Some(product);
        }
    }
    if best_score >= ACCEPT_THRESHOLD {
        best
    } else {
        None
    }
}

/// Name-only lookup used where a loose description match would be
/// worse than no match, such as picking an image to send. Only exact
/// and substring matches qualify.
pub fn find_product_by_name<'a>(query: &str, products: &'a [Product]) -> Option<&'a Product> {
    let query_lower = query.to_lowercase();
    let mut best: Option<&Product> = None;
    let mut best_score = 0;
    for product in products {
        let name_lower = product.name.to_lowercase();
        let s = if name_lower == query_lower {
            100
        } else if query_lower.contains(&name_lower) || name_lower.contains(&query_lower) {
            50
        } else {
            0
        };
        if s > best_score {
            best_score = s;
            best = Some(product);
        }
    }
    if best_score >= ACCEPT_THRESHOLD {
        best
    } else {
        None
    }
}
