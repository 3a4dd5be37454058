// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixture builders shared by integration tests.

use sokoni_core::{
    Agent, MessageKind, NormalizedMessage, PaymentMode, Product, ProductType, RawInbound,
    RawPayload, VariantGroup, VariantOption, VariantPricing,
};

/// An active agent with sane defaults and online payment.
pub fn agent() -> Agent {
    Agent {
        id: "a1".to_string(),
        user_id: "u1".to_string(),
        name: "Boutique Awa".to_string(),
        is_active: true,
        model: "gpt-4o-mini".to_string(),
        temperature: 0.7,
        max_tokens: 500,
        system_prompt: Some("Tu es le vendeur de la Boutique Awa.".to_string()),
        use_emojis: true,
        tone: None,
        language: "fr".to_string(),
        business_address: None,
        business_hours: None,
        latitude: None,
        longitude: None,
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

/// A candle product with a fixed-pricing size variant.
pub fn bougie() -> Product {
    Product {
        id: "p1".to_string(),
        user_id: "u1".to_string(),
        name: "Bougie parfumée".to_string(),
        price: 1500,
        description: Some("Bougie artisanale à la vanille".to_string()),
        ai_instructions: None,
        product_type: ProductType::Physical,
        image_url: Some("https://cdn.example/bougie.jpg".to_string()),
        is_available: true,
        variants: vec![VariantGroup {
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
                    price: 2000,
                    image: None,
                },
            ],
        }],
    }
}

/// A consultation service for booking tests.
pub fn consultation() -> Product {
    Product {
        id: "s1".to_string(),
        user_id: "u1".to_string(),
        name: "Consultation beauté".to_string(),
        price: 5000,
        description: None,
        ai_instructions: None,
        product_type: ProductType::Service,
        image_url: None,
        is_available: true,
        variants: Vec::new(),
    }
}

/// A raw inbound text message as the bridge would deliver it.
pub fn raw_text(id: &str, jid: &str, body: &str) -> RawInbound {
    RawInbound {
        id: id.to_string(),
        remote_jid: jid.to_string(),
        from_me: false,
        push_name: Some("Mariam".to_string()),
        timestamp: "2026-08-23T10:00:00Z".to_string(),
        payload: RawPayload::Text {
            body: body.to_string(),
        },
    }
}

/// A normalized text message ready for the pipeline.
pub fn normalized_text(id: &str, sender: &str, text: &str) -> NormalizedMessage {
    NormalizedMessage {
        id: id.to_string(),
        sender: sender.to_string(),
        sender_jid: format!("{sender}@s.whatsapp.net"),
        push_name: Some("Mariam".to_string()),
        kind: MessageKind::Text,
        text: text.to_string(),
        media_base64: None,
        timestamp: "2026-08-23T10:00:00Z".to_string(),
    }
}

/// A normalized voice note carrying base64 audio.
pub fn normalized_audio(id: &str, sender: &str) -> NormalizedMessage {
    NormalizedMessage {
        media_base64: Some("T2dnUw==".to_string()),
        kind: MessageKind::Audio,
        text: String::new(),
        ..normalized_text(id, sender, "")
    }
}
