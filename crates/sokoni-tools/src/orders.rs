// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `create_order` handler: catalog resolution, pricing, persistence,
//! and the payment-instruction payload.

use std::collections::HashMap;

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use sokoni_catalog::{resolve_item, ResolutionFailure, ResolvedItem};
use sokoni_core::{
    normalize_phone, Order, OrderItem, OrderStatus, PaymentMethod, PaymentMode, Store,
};

use crate::executor::{error_json, short_id, ToolContext};

#[derive(Deserialize)]
struct CreateOrderArgs {
    items: Vec<ItemArg>,
    #[serde(default)]
    customer_name: Option<String>,
    #[serde(default)]
    customer_phone: Option<String>,
    #[serde(default)]
    delivery_address: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    payment_method: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Deserialize)]
struct ItemArg {
    product_name: String,
    quantity: i64,
    #[serde(default)]
    selected_variants: Option<HashMap<String, serde_json::Value>>,
}

pub async fn create_order(
    store: &dyn Store,
    app_url: &str,
    arguments: &str,
    ctx: &ToolContext<'_>,
) -> String {
    let args: CreateOrderArgs = match serde_json::from_str(arguments) {
        Ok(args) => args,
        Err(e) => {
            error!(error = %e, "create_order: bad arguments");
            return error_json("Erreur lors de la création de la commande");
        }
    };

    let mut total: i64 = 0;
    let mut resolved: Vec<ResolvedItem> = Vec::new();
    for item in &args.items {
        let selections: Vec<(String, String)> = item
            .selected_variants
            .iter()
            .flatten()
            .map(|(key, value)| {
                let value = value
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| value.to_string());
                (key.clone(), value)
            })
            .collect();

        match resolve_item(&item.product_name, item.quantity, &selections, ctx.products) {
            Ok(line) => {
                total += line.unit_price * line.quantity;
                resolved.push(line);
            }
            Err(ResolutionFailure::ProductNotFound { query, available }) => {
                warn!(query = %query, "create_order: product not found");
                return json!({
                    "success": false,
                    "error": format!(
                        "Je ne trouve pas \"{query}\" dans notre catalogue. Voici nos produits disponibles : {}",
                        available.join(", ")
                    ),
                    "available_products": available,
                })
                .to_string();
            }
            Err(ResolutionFailure::MissingVariants {
                product_name,
                missing,
            }) => {
                let options_summary: Vec<String> = missing
                    .iter()
                    .map(|m| format!("{}: {}", m.name, m.options.join(", ")))
                    .collect();
                return json!({
                    "success": false,
                    "error": format!(
                        "VARIANTES MANQUANTES pour \"{product_name}\". Demandez au client: {}",
                        options_summary.join(" | ")
                    ),
                    "product_name": product_name,
                    "missing_variants": missing,
                    "hint": "Utilisez \"selected_variants\" dans items. Exemple: {\"Taille\": \"Moyenne\", \"Couleur\": \"Bleu Marine\"}",
                })
                .to_string();
            }
        }
    }

    let mut notes = args.notes.unwrap_or_default();
    if let Some(email) = &args.email {
        notes.push_str(&format!("\n📧 Email client: {email}"));
    }

    let phone = args
        .customer_phone
        .as_deref()
        .unwrap_or(ctx.customer_phone);
    let normalized_phone = normalize_phone(phone);

    let payment_method = match args.payment_method.as_deref() {
        Some("cod") => PaymentMethod::Cod,
        _ => PaymentMethod::Online,
    };
    let status = if payment_method == PaymentMethod::Cod {
        OrderStatus::PendingDelivery
    } else {
        OrderStatus::Pending
    };

    let order = Order {
        id: Uuid::new_v4().to_string(),
        user_id: ctx.agent.user_id.clone(),
        agent_id: ctx.agent.id.clone(),
        conversation_id: Some(ctx.conversation_id.to_string()),
        customer_name: args
            .customer_name
            .unwrap_or_else(|| "Non spécifié".to_string()),
        customer_phone: normalized_phone,
        delivery_address: Some(
            args.delivery_address
                .unwrap_or_else(|| "Non spécifié".to_string()),
        ),
        payment_method,
        status,
        total,
        notes: if notes.is_empty() { None } else { Some(notes) },
        created_at: Utc::now().to_rfc3339(),
    };
    let items: Vec<OrderItem> = resolved
        .iter()
        .map(|line| OrderItem {
            order_id: order.id.clone(),
            product_name: line.display_name.clone(),
            product_description: line.description.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
        })
        .collect();

    if let Err(e) = store.insert_order(&order, &items).await {
        error!(error = %e, "create_order: insert failed");
        return error_json("Erreur lors de la création de la commande");
    }
    info!(order_id = %order.id, total, items = items.len(), "order created");

    let short = short_id(&order.id);

    if payment_method == PaymentMethod::Cod {
        return json!({
            "success": true,
            "order_id": order.id,
            "payment_method": "cod",
            "message": format!("Commande #{short} créée. Total: {total} FCFA. Paiement à la livraison."),
        })
        .to_string();
    }

    if ctx.agent.payment_mode == PaymentMode::MobileMoneyDirect {
        let mut payment_methods = Vec::new();
        if let Some(number) = &ctx.agent.mobile_money_orange {
            payment_methods.push(json!({ "type": "Orange Money", "number": number }));
        }
        if let Some(number) = &ctx.agent.mobile_money_mtn {
            payment_methods.push(json!({ "type": "MTN Money", "number": number }));
        }
        if let Some(number) = &ctx.agent.mobile_money_wave {
            payment_methods.push(json!({ "type": "Wave", "number": number }));
        }
        return json!({
            "success": true,
            "order_id": order.id,
            "total": total,
            "payment_method": "mobile_money_direct",
            "payment_methods": payment_methods,
            "message": format!(
                "Commande #{short} créée. Total: {total} FCFA. Envoyez le paiement puis la capture d'écran."
            ),
        })
        .to_string();
    }

    json!({
        "success": true,
        "order_id": order.id,
        "total": total,
        "payment_method": "online",
        "payment_link": format!("{app_url}/pay/{}", order.id),
        "message": format!("Commande #{short} créée. Total: {total} FCFA."),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ToolExecutor;
    use crate::test_support::{agent, bougie, call, open_store};

    #[tokio::test]
    async fn order_with_variants_persists_and_links_payment() {
        let (store, _dir) = open_store().await;
        let executor = ToolExecutor::new(store.clone(), "https://app.example".to_string());
        let agent = agent();
        let products = vec![bougie()];
        let ctx = ToolContext {
            agent: &agent,
            customer_phone: "22501020304",
            conversation_id: "c1",
            products: &products,
        };

        let result = executor
            .execute(
                &call(
                    "create_order",
                    json!({
                        "items": [{
                            "product_name": "Bougie parfumée",
                            "quantity": 2,
                            "selected_variants": {"Taille": "Grande"}
                        }],
                        "customer_name": "Mariam",
                        "customer_phone": "+225 01 02 03 04",
                        "delivery_address": "Yopougon"
                    }),
                ),
                &ctx,
            )
            .await;

        let payload: serde_json::Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(payload["success"], true);
        assert_eq!(payload["total"], 4000);
        let order_id = payload["order_id"].as_str().unwrap();
        assert_eq!(
            payload["payment_link"],
            format!("https://app.example/pay/{order_id}")
        );

        let order = store.get_order(order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.customer_phone, "22501020304");
        let items = store.order_items(order_id).await.unwrap();
        assert_eq!(items[0].product_name, "Bougie parfumée (Grande (200g))");
        assert_eq!(items[0].unit_price, 2000);
    }

    #[tokio::test]
    async fn cod_orders_go_straight_to_delivery() {
        let (store, _dir) = open_store().await;
        let executor = ToolExecutor::new(store.clone(), "https://app.example".to_string());
        let agent = agent();
        let mut product = bougie();
        product.variants.clear();
        let products = vec![product];
        let ctx = ToolContext {
            agent: &agent,
            customer_phone: "22501020304",
            conversation_id: "c1",
            products: &products,
        };

        let result = executor
            .execute(
                &call(
                    "create_order",
                    json!({
                        "items": [{"product_name": "Bougie parfumée", "quantity": 1}],
                        "customer_name": "Mariam",
                        "customer_phone": "22501020304",
                        "payment_method": "cod"
                    }),
                ),
                &ctx,
            )
            .await;

        let payload: serde_json::Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(payload["success"], true);
        assert_eq!(payload["payment_method"], "cod");
        assert!(payload.get("payment_link").is_none());

        let order_id = payload["order_id"].as_str().unwrap();
        let order = store.get_order(order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::PendingDelivery);
    }

    #[tokio::test]
    async fn mobile_money_agents_send_their_numbers() {
        let (store, _dir) = open_store().await;
        let executor = ToolExecutor::new(store.clone(), "https://app.example".to_string());
        let mut agent = agent();
        agent.payment_mode = PaymentMode::MobileMoneyDirect;
        agent.mobile_money_orange = Some("0707070707".to_string());
        agent.mobile_money_wave = Some("0101010101".to_string());
        let mut product = bougie();
        product.variants.clear();
        let products = vec![product];
        let ctx = ToolContext {
            agent: &agent,
            customer_phone: "22501020304",
            conversation_id: "c1",
            products: &products,
        };

        let result = executor
            .execute(
                &call(
                    "create_order",
                    json!({
                        "items": [{"product_name": "Bougie parfumée", "quantity": 1}],
                        "customer_name": "Mariam",
                        "customer_phone": "22501020304"
                    }),
                ),
                &ctx,
            )
            .await;

        let payload: serde_json::Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(payload["payment_method"], "mobile_money_direct");
        let methods = payload["payment_methods"].as_array().unwrap();
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0]["type"], "Orange Money");
        assert_eq!(methods[1]["type"], "Wave");
    }

    #[tokio::test]
    async fn missing_variants_block_the_order() {
        let (store, _dir) = open_store().await;
        let executor = ToolExecutor::new(store.clone(), "https://app.example".to_string());
        let agent = agent();
        let products = vec![bougie()];
        let ctx = ToolContext {
            agent: &agent,
            customer_phone: "22501020304",
            conversation_id: "c1",
            products: &products,
        };

        let result = executor
            .execute(
                &call(
                    "create_order",
                    json!({
                        "items": [{"product_name": "Bougie parfumée", "quantity": 1}],
                        "customer_name": "Mariam",
                        "customer_phone": "22501020304"
                    }),
                ),
                &ctx,
            )
            .await;

        let payload: serde_json::Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(payload["success"], false);
        assert!(payload["error"]
            .as_str()
            .unwrap()
            .contains("VARIANTES MANQUANTES"));
        assert_eq!(payload["missing_variants"][0]["name"], "Taille");
        // Nothing was persisted.
        assert!(store
            .recent_orders_for_phone("a1", "22501020304", 5)
            .await
            .unwrap()
            .is_empty());
    }
}
