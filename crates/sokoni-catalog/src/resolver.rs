// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Variant resolution and per-item pricing.
//!
//! The AI sends a `selected_variants` map keyed by group name. Values
//! are matched flexibly against catalog options so "Petite" still
//! matches "Petite (50g)". Groups the map misses get one fallback scan
//! of the raw requested name before the item is rejected.

use serde::Serialize;

use sokoni_core::{Product, VariantGroup, VariantOption, VariantPricing};

use crate::matcher::find_product;

/// A variant group the customer still has to pick from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingVariant {
    pub name: String,
    pub options: Vec<String>,
}

/// Expected, user-correctable resolution outcomes. These are data for
/// the AI to relay conversationally, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionFailure {
    /// No catalog product scored high enough for the requested name.
    ProductNotFound {
        query: String,
        available: Vec<String>,
    },
    /// The product was found but one or more variant groups have no
    /// selection.
    MissingVariants {
        product_name: String,
        missing: Vec<MissingVariant>,
    },
}

/// One fully resolved order line with its snapshot price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedItem {
    pub product_id: String,
    /// Catalog name annotated with matched variant values, e.g.
    /// `"Bougie parfumée (Grande (200g), Vanille)"`.
    pub display_name: String,
    pub description: Option<String>,
    pub quantity: i64,
    /// Unit price in minor units after variant pricing.
    pub unit_price: i64,
    /// Matched `(group, option value)` pairs in catalog group order.
    pub matched_variants: Vec<(String, String)>,
}

/// Flexible option match: equality, option starts with the value, the
/// value starts with the option, or the option contains the value.
/// All comparisons are case-insensitive on trimmed strings.
pub fn find_matching_option<'a>(
    group: &'a VariantGroup,
    selected: &str,
) -> Option<&'a VariantOption> {
    let selected_lower = selected.trim().to_lowercase();
    group.options.iter().find(|option| {
        let opt_lower = option.value.trim().to_lowercase();
        opt_lower == selected_lower
            || opt_lower.starts_with(&selected_lower)
            || selected_lower.starts_with(&opt_lower)
            || opt_lower.contains(&selected_lower)
    })
}

fn apply_option_price(price: &mut i64, group: &VariantGroup, option: &VariantOption) {
    match group.pricing {
        VariantPricing::Fixed => *price = option.price,
        VariantPricing::Additive => *price += option.price,
    }
}

/// Resolve one requested item against the catalog.
///
/// `selected_variants` entries are matched to groups by
/// case-insensitive name. Groups without an entry fall back to
/// scanning `requested_name` for an option label.
pub fn resolve_item(
    requested_name: &str,
    quantity: i64,
    selected_variants: &[(String, String)],
    products: &[Product],
) -> Result<ResolvedItem, ResolutionFailure> {
    let Some(product) = find_product(requested_name, products) else {
        return Err(ResolutionFailure::ProductNotFound {
            query: requested_name.to_string(),
            available: products.iter().map(|p| p.name.clone()).collect(),
        });
    };

    let mut price = product.price;
    let mut matched: Vec<(String, String)> = Vec::new();

    for group in &product.variants {
        let group_lower = group.name.to_lowercase();
        let selected = selected_variants
            .iter()
            .find(|(key, _)| key.to_lowercase() == group_lower)
            .map(|(_, value)| value.as_str());
        if let Some(value) = selected {
            if let Some(option) = find_matching_option(group, value) {
                apply_option_price(&mut price, group, option);
                matched.push((group.name.clone(), option.value.clone()));
            }
        }
    }

    // Fallback: the AI sometimes bakes the option into the product name
    // ("Bougie Grande") instead of filling selected_variants.
    let requested_lower = requested_name.to_lowercase();
    for group in &product.variants {
        if matched.iter().any(|(name, _)| name == &group.name) {
            continue;
        }
        if let Some(option) = group
            .options
            .iter()
            .find(|o| !o.value.is_empty() && requested_lower.contains(&o.value.to_lowercase()))
        {
            apply_option_price(&mut price, group, option);
            matched.push((group.name.clone(), option.value.clone()));
        }
    }

    let missing: Vec<MissingVariant> = product
        .variants
        .iter()
        .filter(|group| !matched.iter().any(|(name, _)| name == &group.name))
        .map(|group| MissingVariant {
            name: group.name.clone(),
            options: group.options.iter().map(|o| o.value.clone()).collect(),
        })
        .collect();
    if !missing.is_empty() {
        return Err(ResolutionFailure::MissingVariants {
            product_name: product.name.clone(),
            missing,
        });
    }

    let display_name = if matched.is_empty() {
        product.name.clone()
    } else {
        let values: Vec<&str> = matched.iter().map(|(_, v)| v.as_str()).collect();
        format!("{} ({})", product.name, values.join(", "))
    };

    Ok(ResolvedItem {
        product_id: product.id.clone(),
        display_name,
        description: product.description.clone(),
        quantity,
        unit_price: price,
        matched_variants: matched,
    })
}

/// Variant-specific image for a product, falling back to the product
/// image. `variant_value` is matched by containment against option
/// values that carry an image.
pub fn product_image<'a>(product: &'a Product, variant_value: Option<&str>) -> Option<&'a str> {
    if let Some(value) = variant_value {
        let value_lower = value.to_lowercase();
        for group in &product.variants {
            for option in &group.options {
                if let Some(image) = option.image.as_deref() {
                    if option.value.to_lowercase().contains(&value_lower) {
                        return Some(image);
                    }
                }
            }
        }
    }
    product.image_url.as_deref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sokoni_core::ProductType;

    fn bougie() -> Product {
        Product {
            id: "p1".to_string(),
            user_id: "user-1".to_string(),
            name: "Bougie parfumée".to_string(),
            price: 1500,
            description: Some("Bougie artisanale".to_string()),
            ai_instructions: None,
            product_type: ProductType::Physical,
            image_url: Some("https://cdn.example/bougie.jpg".to_string()),
            is_available: true,
            variants: vec![
                VariantGroup {
                    name: "Taille".to_string(),
                    pricing: VariantPricing::Fixed,
                    options: vec![
                        VariantOption {
                            value: "Petite (50g)".to_string(),
                            price: 1000,
                            image: None,
                        },
                        VariantOption {
                            value: "Grande (200g)".to_string(),
                            price: 2500,
                            image: Some("https://cdn.example/grande.jpg".to_string()),
                        },
                    ],
                },
                VariantGroup {
                    name: "Parfum".to_string(),
                    pricing: VariantPricing::Additive,
                    options: vec![
                        VariantOption {
                            value: "Vanille".to_string(),
                            price: 0,
                            image: None,
                        },
                        VariantOption {
                            value: "Oud Premium".to_string(),
                            price: 500,
                            image: None,
                        },
                    ],
                },
            ],
        }
    }

    fn selections(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn partial_value_matches_full_option_label() {
        let products = vec![bougie()];
        let item = resolve_item(
            "Bougie parfumée",
            2,
            &selections(&[("Taille", "Petite"), ("Parfum", "Vanille")]),
            &products,
        )
        .unwrap();
        // Fixed pricing replaces the base price.
        assert_eq!(item.unit_price, 1000);
        assert_eq!(item.display_name, "Bougie parfumée (Petite (50g), Vanille)");
    }

    #[test]
    fn additive_option_adds_to_fixed_price() {
        let products = vec![bougie()];
        let item = resolve_item(
            "Bougie parfumée",
            1,
            &selections(&[("taille", "Grande"), ("PARFUM", "Oud")]),
            &products,
        )
        .unwrap();
        // Group names match case-insensitively; 2500 fixed + 500 additive.
        assert_eq!(item.unit_price, 3000);
        assert_eq!(
            item.matched_variants,
            vec![
                ("Taille".to_string(), "Grande (200g)".to_string()),
                ("Parfum".to_string(), "Oud Premium".to_string()),
            ]
        );
    }

    #[test]
    fn option_baked_into_name_is_recovered() {
        let products = vec![bougie()];
        let item = resolve_item(
            "Bougie parfumée Grande (200g) Vanille",
            1,
            &selections(&[]),
            &products,
        )
        .unwrap();
        assert_eq!(item.unit_price, 2500);
        assert_eq!(item.display_name, "Bougie parfumée (Grande (200g), Vanille)");
    }

    #[test]
    fn missing_group_lists_its_options() {
        let products = vec![bougie()];
        let err = resolve_item(
            "Bougie parfumée",
            1,
            &selections(&[("Taille", "Petite")]),
            &products,
        )
        .unwrap_err();
        match err {
            ResolutionFailure::MissingVariants {
                product_name,
                missing,
            } => {
                assert_eq!(product_name, "Bougie parfumée");
                assert_eq!(missing.len(), 1);
                assert_eq!(missing[0].name, "Parfum");
                assert_eq!(missing[0].options, vec!["Vanille", "Oud Premium"]);
            }
            other => panic!("expected MissingVariants, got {other:?}"),
        }
    }

    #[test]
    fn invalid_option_value_counts_as_missing() {
        let products = vec![bougie()];
        let err = resolve_item(
            "Bougie parfumée",
            1,
            &selections(&[("Taille", "Géante"), ("Parfum", "Vanille")]),
            &products,
        )
        .unwrap_err();
        assert!(matches!(err, ResolutionFailure::MissingVariants { .. }));
    }

    #[test]
    fn unknown_product_reports_the_catalog() {
        let products = vec![bougie()];
        let err = resolve_item("climatiseur", 1, &selections(&[]), &products).unwrap_err();
        match err {
            ResolutionFailure::ProductNotFound { query, available } => {
                assert_eq!(query, "climatiseur");
                assert_eq!(available, vec!["Bougie parfumée"]);
            }
            other => panic!("expected ProductNotFound, got {other:?}"),
        }
    }

    #[test]
    fn product_without_variants_keeps_base_price() {
        let mut simple = bougie();
        simple.variants.clear();
        let products = vec![simple];
        let item = resolve_item("Bougie parfumée", 3, &selections(&[]), &products).unwrap();
        assert_eq!(item.unit_price, 1500);
        assert_eq!(item.display_name, "Bougie parfumée");
        assert!(item.matched_variants.is_empty());
    }

    #[test]
    fn variant_image_wins_over_product_image() {
        let product = bougie();
        assert_eq!(
            product_image(&product, Some("grande")),
            Some("https://cdn.example/grande.jpg")
        );
        // No image on the matched option falls back to the product image.
        assert_eq!(
            product_image(&product, Some("vanille")),
            Some("https://cdn.example/bougie.jpg")
        );
        assert_eq!(
            product_image(&product, None),
            Some("https://cdn.example/bougie.jpg")
        );
    }
}
