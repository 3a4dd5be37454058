// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI function-calling schemas for the commerce tools.

use serde_json::{json, Value};

/// Tool definitions offered to the AI on the first call of each turn.
///
/// Each definition has the shape:
/// ```json
/// { "type": "function", "function": { "name": ..., "description": ..., "parameters": ... } }
/// ```
pub fn tool_definitions() -> Vec<Value> {
    vec![
        json!({
            "type": "function",
            "function": {
                "name": "create_order",
                "description": "Create a new order for a customer. Use this when the user wants to buy something.\nIMPORTANT FOR PRODUCTS WITH VARIANTS:\n- If a product has variants (size, color, etc.), you MUST specify them in 'selected_variants'\n- Collect ALL variants from the customer BEFORE calling this function\n- Example: selected_variants: {\"Taille\": \"Moyenne\", \"Couleur\": \"Bleu Marine\"}\n- If variants are missing, the order will FAIL and you'll need to ask the customer",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "items": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "product_name": {
                                        "type": "string",
                                        "description": "EXACT name of the product from the catalog (without variant info)"
                                    },
                                    "quantity": {
                                        "type": "integer",
                                        "description": "Quantity ordered"
                                    },
                                    "selected_variants": {
                                        "type": "object",
                                        "description": "REQUIRED if product has variants. Key = variant name (e.g. \"Taille\", \"Couleur\"), Value = selected option (e.g. \"Moyenne\", \"Bleu Marine\")",
                                        "additionalProperties": { "type": "string" }
                                    }
                                },
                                "required": ["product_name", "quantity"]
                            },
                            "description": "List of products to order"
                        },
                        "customer_name": { "type": "string", "description": "Customer full name (required)" },
                        "customer_phone": { "type": "string", "description": "Customer phone number (required)" },
                        "delivery_address": { "type": "string", "description": "Full Delivery Location (City, Neighborhood, Street, or GPS info). Do NOT split city/street." },
                        "email": { "type": "string", "description": "Customer email (required for digital products)" },
                        "payment_method": { "type": "string", "enum": ["online", "cod"], "description": "Payment method choice" },
                        "notes": { "type": "string", "description": "Any special instructions" }
                    },
                    "required": ["items", "customer_name", "customer_phone"]
                }
            }
        }),
        json!({
            "type": "function",
            "function": {
                "name": "check_payment_status",
                "description": "Check the status of a specific order. If the user asks about \"my order\" or \"the payment\" without giving an ID, USE the most recent UUID found in the \"Historique des Commandes\" context.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "order_id": { "type": "string", "description": "The Order ID UUID" }
                    },
                    "required": ["order_id"]
                }
            }
        }),
        json!({
            "type": "function",
            "function": {
                "name": "send_image",
                "description": "Send an image of a product. Use ONLY when user explicitly asks to see a product or during a sales pitch. DO NOT use when checking order status.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "product_name": { "type": "string", "description": "The name of the product to show" },
                        "variant_value": { "type": "string", "description": "Optional: Specific variant option (e.g., \"Rouge\", \"Bleu\", \"XL\") to show variant-specific image if available" }
                    },
                    "required": ["product_name"]
                }
            }
        }),
        json!({
            "type": "function",
            "function": {
                "name": "create_booking",
                "description": "Create a booking/reservation for a SERVICE (not physical products). Use this when the user wants to book a service like consultation, installation, maintenance, etc. This is different from create_order which is for products.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "service_name": { "type": "string", "description": "Name of the service from the catalog" },
                        "customer_phone": { "type": "string", "description": "Customer phone number (required)" },
                        "customer_name": { "type": "string", "description": "Customer name" },
                        "preferred_date": { "type": "string", "description": "Preferred date for the service (YYYY-MM-DD format)" },
                        "preferred_time": { "type": "string", "description": "Preferred time (HH:MM format, e.g., 14:00)" },
                        "location": { "type": "string", "description": "Location for the service (address or \"remote/online\")" },
                        "notes": { "type": "string", "description": "Special requirements or additional details" }
                    },
                    "required": ["service_name", "customer_phone", "preferred_date"]
                }
            }
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definitions_cover_the_four_tools() {
        let defs = tool_definitions();
        let names: Vec<&str> = defs
            .iter()
            .map(|d| d["function"]["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec!["create_order", "check_payment_status", "send_image", "create_booking"]
        );
        for def in &defs {
            assert_eq!(def["type"], "function");
            assert_eq!(def["function"]["parameters"]["type"], "object");
        }
    }

    #[test]
    fn create_order_requires_items_and_identity() {
        let defs = tool_definitions();
        let required = defs[0]["function"]["parameters"]["required"]
            .as_array()
            .unwrap();
        assert_eq!(required.len(), 3);
        assert!(required.contains(&serde_json::json!("items")));
        assert!(required.contains(&serde_json::json!("customer_phone")));
    }
}
