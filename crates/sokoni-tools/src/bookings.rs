// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `create_booking` handler for service products.

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use sokoni_core::{normalize_phone, Booking, ProductType, Store};

use crate::executor::{error_json, ToolContext};

#[derive(Deserialize)]
struct CreateBookingArgs {
    service_name: String,
    customer_phone: String,
    #[serde(default)]
    customer_name: Option<String>,
    preferred_date: String,
    #[serde(default)]
    preferred_time: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

pub async fn create_booking(store: &dyn Store, arguments: &str, ctx: &ToolContext<'_>) -> String {
    let args: CreateBookingArgs = match serde_json::from_str(arguments) {
        Ok(args) => args,
        Err(e) => {
            error!(error = %e, "create_booking: bad arguments");
            return error_json("Erreur lors de la réservation");
        }
    };

    let services: Vec<_> = ctx
        .products
        .iter()
        .filter(|p| p.product_type == ProductType::Service)
        .collect();
    let requested_lower = args.service_name.to_lowercase();
    let Some(service) = services
        .iter()
        .find(|s| s.name.to_lowercase().contains(&requested_lower))
    else {
        let available: Vec<&str> = services.iter().map(|s| s.name.as_str()).collect();
        let listing = if available.is_empty() {
            "Aucun".to_string()
        } else {
            available.join(", ")
        };
        return error_json(&format!(
            "Service \"{}\" non trouvé. Services disponibles : {listing}",
            args.service_name
        ));
    };

    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        user_id: ctx.agent.user_id.clone(),
        agent_id: ctx.agent.id.clone(),
        conversation_id: Some(ctx.conversation_id.to_string()),
        service_id: service.id.clone(),
        service_name: service.name.clone(),
        price: service.price,
        customer_phone: normalize_phone(&args.customer_phone),
        customer_name: args.customer_name,
        preferred_date: args.preferred_date.clone(),
        preferred_time: args.preferred_time,
        location: args.location,
        notes: args.notes,
        status: "scheduled".to_string(),
        created_at: Utc::now().to_rfc3339(),
    };

    if let Err(e) = store.insert_booking(&booking).await {
        error!(error = %e, "create_booking: insert failed");
        return error_json("Erreur lors de la réservation");
    }
    info!(booking_id = %booking.id, service = %service.name, "booking created");

    json!({
        "success": true,
        "booking_id": booking.id,
        "message": format!(
            "📅 Réservation créée ! Service: {}, Date: {}",
            service.name, args.preferred_date
        ),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ToolExecutor;
    use crate::test_support::{agent, call, open_store};
    use sokoni_core::Product;

    fn massage() -> Product {
        Product {
            id: "s1".to_string(),
            user_id: "user-1".to_string(),
            name: "Massage relaxant".to_string(),
            price: 15000,
            description: None,
            ai_instructions: None,
            product_type: ProductType::Service,
            image_url: None,
            is_available: true,
            variants: Vec::new(),
        }
    }

    #[tokio::test]
    async fn booking_matches_service_by_containment() {
        let (store, _dir) = open_store().await;
        let executor = ToolExecutor::new(store.clone(), "https://app.example".to_string());
        let agent = agent();
        let products = vec![massage()];
        let ctx = ToolContext {
            agent: &agent,
            customer_phone: "22501020304",
            conversation_id: "c1",
            products: &products,
        };

        let result = executor
            .execute(
                &call(
                    "create_booking",
                    json!({
                        "service_name": "massage",
                        "customer_phone": "+22501020304",
                        "preferred_date": "2026-03-01",
                        "preferred_time": "14:00"
                    }),
                ),
                &ctx,
            )
            .await;

        let payload: serde_json::Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(payload["success"], true);
        assert!(payload["message"]
            .as_str()
            .unwrap()
            .contains("Massage relaxant"));
    }

    #[tokio::test]
    async fn physical_products_are_not_bookable() {
        let (store, _dir) = open_store().await;
        let executor = ToolExecutor::new(store, "https://app.example".to_string());
        let agent = agent();
        let products = vec![crate::test_support::bougie()];
        let ctx = ToolContext {
            agent: &agent,
            customer_phone: "22501020304",
            conversation_id: "c1",
            products: &products,
        };

        let result = executor
            .execute(
                &call(
                    "create_booking",
                    json!({
                        "service_name": "bougie",
                        "customer_phone": "22501020304",
                        "preferred_date": "2026-03-01"
                    }),
                ),
                &ctx,
            )
            .await;

        let payload: serde_json::Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(payload["success"], false);
        assert!(payload["error"].as_str().unwrap().contains("Aucun"));
    }
}
