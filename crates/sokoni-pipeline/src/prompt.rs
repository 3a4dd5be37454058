// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System-prompt assembly for the AI responder.
//!
//! The prompt carries everything the model needs in one turn: the
//! agent's persona, style flags, the live catalog with variants and
//! prices, business location and hours, and this customer's recent
//! orders.

use sokoni_core::{Agent, Order, Product, VariantPricing};

/// Builds the per-turn system prompt.
pub fn build_system_prompt(agent: &Agent, products: &[Product], recent_orders: &[Order]) -> String {
    let mut prompt = String::new();

    match &agent.system_prompt {
        Some(persona) if !persona.trim().is_empty() => prompt.push_str(persona),
        _ => prompt.push_str(&format!(
            "Tu es {}, assistant commercial sur WhatsApp. Tu aides les clients \
             à découvrir les produits, passer commande et suivre leurs paiements.",
            agent.name
        )),
    }
    prompt.push('\n');

    prompt.push_str(&format!("\nRéponds toujours en {}.", language_name(&agent.language)));
    if let Some(tone) = &agent.tone {
        prompt.push_str(&format!(" Adopte un ton {tone}."));
    }
    if agent.use_emojis {
        prompt.push_str(" Utilise des emojis avec modération.");
    } else {
        prompt.push_str(" N'utilise pas d'emojis.");
    }
    prompt.push_str(" Sois concis: tes réponses partent sur WhatsApp.\n");

    if products.is_empty() {
        prompt.push_str("\nCATALOGUE: aucun produit disponible actuellement.\n");
    } else {
        prompt.push_str("\nCATALOGUE (prix en FCFA):\n");
        for product in products {
            prompt.push_str(&catalog_line(product));
        }
    }

    let mut business = String::new();
    if let Some(address) = &agent.business_address {
        business.push_str(&format!("Adresse: {address}\n"));
    }
    if let Some(hours) = &agent.business_hours {
        business.push_str(&format!("Horaires: {hours}\n"));
    }
    if let (Some(lat), Some(lon)) = (agent.latitude, agent.longitude) {
        business.push_str(&format!(
            "Localisation GPS: https://maps.google.com/?q={lat},{lon}\n"
        ));
    }
    if !business.is_empty() {
        prompt.push_str("\nINFORMATIONS BOUTIQUE:\n");
        prompt.push_str(&business);
    }

    if !recent_orders.is_empty() {
        prompt.push_str("\nCOMMANDES RÉCENTES DE CE CLIENT:\n");
        for order in recent_orders {
            prompt.push_str(&format!(
                "- #{} : {} FCFA, statut {}\n",
                order.id.get(..8).unwrap_or(&order.id),
                order.total,
                order.status
            ));
        }
    }

    prompt.push_str(
        "\nOUTILS:\n\
         - create_order quand le client confirme un achat. Si un produit a des \
           variantes, demande le choix du client AVANT d'appeler l'outil et \
           transmets-le dans selected_variants.\n\
         - create_booking pour réserver un service.\n\
         - send_image quand le client veut voir un produit.\n\
         - check_payment_status quand le client demande où en est son paiement.\n\
         Relaie fidèlement les erreurs des outils (produit introuvable, \
         variantes manquantes) en reformulant en langage naturel.\n",
    );

    prompt
}

fn language_name(code: &str) -> &str {
    match code {
        "fr" => "français",
        "en" => "anglais",
        other => other,
    }
}

fn catalog_line(product: &Product) -> String {
    let mut line = format!("- {} : {} FCFA", product.name, product.price);
    if let Some(description) = &product.description {
        line.push_str(&format!(" — {description}"));
    }
    for group in &product.variants {
        let options: Vec<String> = group
            .options
            .iter()
            .map(|option| {
                if option.price > 0 {
                    format!("{} ({} FCFA)", option.value, option.price)
                } else {
                    option.value.clone()
                }
            })
            .collect();
        let mode = match group.pricing {
            VariantPricing::Fixed => "prix fixe",
            VariantPricing::Additive => "supplément",
        };
        line.push_str(&format!(
            "; {} ({}) : {}",
            group.name,
            mode,
            options.join(", ")
        ));
    }
    if let Some(instructions) = &product.ai_instructions {
        line.push_str(&format!(" [Note: {instructions}]"));
    }
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use sokoni_core::{PaymentMode, ProductType, VariantGroup, VariantOption};

    fn agent() -> Agent {
        Agent {
            id: "a1".into(),
            user_id: "u1".into(),
            name: "Boutique Awa".into(),
            is_active: true,
            model: "gpt-4o-mini".into(),
            temperature: 0.7,
            max_tokens: 500,
            system_prompt: None,
            use_emojis: false,
            tone: None,
            language: "fr".into(),
            business_address: Some("Cocody, Abidjan".into()),
            business_hours: Some("9h-18h".into()),
            latitude: Some(5.36),
            longitude: Some(-4.01),
            payment_mode: PaymentMode::CinetpayLink,
            mobile_money_orange: None,
            mobile_money_mtn: None,
            mobile_money_wave: None,
            voice_enabled: false,
            voice_id: None,
            response_delay_seconds: 0,
            total_messages: 0,
            connection_status: None,
            connected: false,
            phone_number: None,
        }
    }

    fn bougie() -> Product {
        Product {
            id: "p1".into(),
            user_id: "u1".into(),
            name: "Bougie parfumée".into(),
            price: 1500,
            description: Some("vanille".into()),
            ai_instructions: Some("proposer la grande en priorité".into()),
            product_type: ProductType::Physical,
            image_url: None,
            is_available: true,
            variants: vec![VariantGroup {
                name: "Taille".into(),
                pricing: VariantPricing::Fixed,
                options: vec![VariantOption {
                    value: "Petite (50g)".into(),
                    price: 1000,
                    image: None,
                }],
            }],
        }
    }

    #[test]
    fn prompt_lists_catalog_with_variants_and_business_info() {
        let prompt = build_system_prompt(&agent(), &[bougie()], &[]);
        assert!(prompt.contains("Bougie parfumée : 1500 FCFA"));
        assert!(prompt.contains("Taille (prix fixe) : Petite (50g) (1000 FCFA)"));
        assert!(prompt.contains("proposer la grande en priorité"));
        assert!(prompt.contains("Cocody, Abidjan"));
        assert!(prompt.contains("https://maps.google.com/?q=5.36,-4.01"));
        assert!(prompt.contains("N'utilise pas d'emojis"));
    }

    #[test]
    fn custom_persona_replaces_the_default() {
        let mut agent = agent();
        agent.system_prompt = Some("Tu es Koffi, vendeur de pagnes.".into());
        agent.tone = Some("chaleureux".into());
        let prompt = build_system_prompt(&agent, &[], &[]);
        assert!(prompt.starts_with("Tu es Koffi"));
        assert!(prompt.contains("Adopte un ton chaleureux."));
        assert!(prompt.contains("aucun produit disponible"));
    }
}
