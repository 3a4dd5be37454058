// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Product catalog reads. The catalog itself is owned by the companion
//! web app; this service only lists what is currently sellable.

use rusqlite::{params, Row};
use sokoni_core::{Product, SokoniError, VariantGroup};

use crate::database::{map_tr_err, Database};
use crate::queries::parse_col;

const PRODUCT_COLUMNS: &str = "id, user_id, name, price, description, ai_instructions, \
     product_type, image_url, is_available, variants";

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    let product_type: String = row.get(6)?;
    let variants_json: Option<String> = row.get(9)?;
    let variants: Vec<VariantGroup> = match variants_json.as_deref() {
        Some(json) if !json.is_empty() => serde_json::from_str(json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
        })?,
        _ => Vec::new(),
    };
    Ok(Product {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        price: row.get(3)?,
        description: row.get(4)?,
        ai_instructions: row.get(5)?,
        product_type: parse_col(6, &product_type)?,
        image_url: row.get(7)?,
        is_available: row.get(8)?,
        variants,
    })
}

/// Available products for the owning user, variants decoded from JSON.
pub async fn available_products(db: &Database, user_id: &str) -> Result<Vec<Product>, SokoniError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PRODUCT_COLUMNS} FROM products
                 WHERE user_id = ?1 AND is_available = 1 ORDER BY name ASC"
            ))?;
            let rows = stmt.query_map(params![user_id], product_from_row)?;
            let mut products = Vec::new();
            for row in rows {
                products.push(row?);
            }
            Ok(products)
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a product row. Catalog CRUD belongs to the companion web app;
/// this exists for fixtures and operational tooling.
pub async fn insert_product(db: &Database, product: &Product) -> Result<(), SokoniError> {
    let product = product.clone();
    let variants_json = if product.variants.is_empty() {
        None
    } else {
        Some(
            serde_json::to_string(&product.variants).map_err(|e| SokoniError::Storage {
                source: Box::new(e),
            })?,
        )
    };
    db.connection()
        .call(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO products ({PRODUCT_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
                ),
                params![
                    product.id,
                    product.user_id,
                    product.name,
                    product.price,
                    product.description,
                    product.ai_instructions,
                    product.product_type.to_string(),
                    product.image_url,
                    product.is_available,
                    variants_json,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
