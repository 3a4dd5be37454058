// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool dispatch.
//!
//! Every handler returns a JSON string for the AI's follow-up call,
//! including on failure. A tool that panicked the pipeline or bubbled
//! an error upward would kill the customer's turn; instead failures
//! become `{"success": false, "error": ...}` payloads the AI can relay.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use sokoni_core::{Agent, Product, Store, ToolCall, ToolResult};

use crate::bookings;
use crate::orders;

/// Per-turn context handed to every tool handler.
pub struct ToolContext<'a> {
    pub agent: &'a Agent,
    /// Normalized customer phone, fallback when the AI omits one.
    pub customer_phone: &'a str,
    pub conversation_id: &'a str,
    pub products: &'a [Product],
}

/// Executes tool calls emitted by the AI responder.
pub struct ToolExecutor {
    store: Arc<dyn Store>,
    app_url: String,
}

impl ToolExecutor {
    pub fn new(store: Arc<dyn Store>, app_url: String) -> Self {
        Self { store, app_url }
    }

    /// Run one tool call. Infallible by contract: the result content is
    /// always a JSON payload.
    pub async fn execute(&self, call: &ToolCall, ctx: &ToolContext<'_>) -> ToolResult {
        let name = call.function.name.as_str();
        info!(tool = name, agent_id = %ctx.agent.id, "executing tool");
        let content = match name {
            "create_order" => {
                orders::create_order(
                    self.store.as_ref(),
                    &self.app_url,
                    &call.function.arguments,
                    ctx,
                )
                .await
            }
            "check_payment_status" => {
                self.check_payment_status(&call.function.arguments).await
            }
            "send_image" => send_image(&call.function.arguments, ctx),
            "create_booking" => {
                bookings::create_booking(self.store.as_ref(), &call.function.arguments, ctx).await
            }
            other => {
                error!(tool = other, "unknown tool requested");
                error_json("Unknown tool")
            }
        };
        ToolResult {
            call_id: call.id.clone(),
            content,
        }
    }

    async fn check_payment_status(&self, arguments: &str) -> String {
        #[derive(Deserialize)]
        struct Args {
            order_id: String,
        }
        let args: Args = match serde_json::from_str(arguments) {
            Ok(args) => args,
            Err(e) => {
                error!(error = %e, "check_payment_status: bad arguments");
                return error_json("Erreur lors de la vérification du paiement.");
            }
        };

        let order = match self.store.get_order(&args.order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                return error_json(&format!("Commande {} introuvable.", args.order_id));
            }
            Err(e) => {
                error!(error = %e, order_id = %args.order_id, "check_payment_status failed");
                return error_json("Erreur lors de la vérification du paiement.");
            }
        };

        let short = short_id(&order.id);
        let message = match order.status {
            sokoni_core::OrderStatus::Pending => format!(
                "⏳ Paiement en attente pour la commande #{short}. Total: {} FCFA.",
                order.total
            ),
            sokoni_core::OrderStatus::Paid => {
                format!("✅ Paiement confirmé ! Commande #{short} en cours de traitement.")
            }
            sokoni_core::OrderStatus::PendingDelivery => {
                format!("📦 Commande #{short} en cours de livraison.")
            }
            sokoni_core::OrderStatus::Delivered => {
                format!("🎉 Commande #{short} livrée avec succès !")
            }
            sokoni_core::OrderStatus::Cancelled => format!("❌ Commande #{short} annulée."),
        };

        json!({
            "success": true,
            "order_id": order.id,
            "status": order.status,
            "message": message,
        })
        .to_string()
    }
}

fn send_image(arguments: &str, ctx: &ToolContext<'_>) -> String {
    #[derive(Deserialize)]
    struct Args {
        product_name: String,
        #[serde(default)]
        variant_value: Option<String>,
    }
    let args: Args = match serde_json::from_str(arguments) {
        Ok(args) => args,
        Err(e) => {
            error!(error = %e, "send_image: bad arguments");
            return error_json("Erreur lors de l'envoi de l'image.");
        }
    };

    let Some(product) = sokoni_catalog::find_product_by_name(&args.product_name, ctx.products)
    else {
        return error_json(&format!("Produit \"{}\" introuvable.", args.product_name));
    };

    match sokoni_catalog::product_image(product, args.variant_value.as_deref()) {
        Some(image_url) => json!({
            "success": true,
            "action": "send_image",
            "image_url": image_url,
            "caption": format!("Voici {} !", product.name),
            "product_name": product.name,
        })
        .to_string(),
        None => error_json(&format!("Pas d'image disponible pour \"{}\".", product.name)),
    }
}

pub(crate) fn error_json(message: &str) -> String {
    json!({ "success": false, "error": message }).to_string()
}

/// First eight characters of an order UUID, the form shown to customers.
pub(crate) fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
