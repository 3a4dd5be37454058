// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order and order-item operations.

use rusqlite::{params, Row};
use sokoni_core::{Order, OrderItem, SokoniError};

use crate::database::{map_tr_err, Database};
use crate::queries::parse_col;

const ORDER_COLUMNS: &str = "id, user_id, agent_id, conversation_id, customer_name, \
     customer_phone, delivery_address, payment_method, status, total, notes, created_at";

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<Order> {
    let payment_method: String = row.get(7)?;
    let status: String = row.get(8)?;
    Ok(Order {
        id: row.get(0)?,
        user_id: row.get(1)?,
        agent_id: row.get(2)?,
        conversation_id: row.get(3)?,
        customer_name: row.get(4)?,
        customer_phone: row.get(5)?,
        delivery_address: row.get(6)?,
        payment_method: parse_col(7, &payment_method)?,
        status: parse_col(8, &status)?,
        total: row.get(9)?,
        notes: row.get(10)?,
        created_at: row.get(11)?,
    })
}

/// Insert an order and its items in one transaction. Either everything
/// lands or nothing does.
pub async fn insert_order(
    db: &Database,
    order: &Order,
    items: &[OrderItem],
) -> Result<(), SokoniError> {
    let order = order.clone();
    let items = items.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                &format!(
                    "INSERT INTO orders ({ORDER_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
                ),
                params![
                    order.id,
                    order.user_id,
                    order.agent_id,
                    order.conversation_id,
                    order.customer_name,
                    order.customer_phone,
                    order.delivery_address,
                    order.payment_method.to_string(),
                    order.status.to_string(),
                    order.total,
                    order.notes,
                    order.created_at,
                ],
            )?;
            for item in &items {
                tx.execute(
                    "INSERT INTO order_items
                         (order_id, product_name, product_description, quantity, unit_price)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        item.order_id,
                        item.product_name,
                        item.product_description,
                        item.quantity,
                        item.unit_price,
                    ],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch one order by id.
pub async fn get_order(db: &Database, order_id: &str) -> Result<Option<Order>, SokoniError> {
    let order_id = order_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"))?;
            let mut rows = stmt.query_map(params![order_id], order_from_row)?;
            match rows.next() {
                Some(row) => Ok(Some(row?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// The customer's newest orders with this agent, newest first.
pub async fn recent_orders_for_phone(
    db: &Database,
    agent_id: &str,
    customer_phone: &str,
    limit: u32,
) -> Result<Vec<Order>, SokoniError> {
    let agent_id = agent_id.to_string();
    let customer_phone = customer_phone.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ORDER_COLUMNS} FROM orders
                 WHERE agent_id = ?1 AND customer_phone = ?2
                 ORDER BY created_at DESC LIMIT ?3"
            ))?;
            let rows = stmt.query_map(params![agent_id, customer_phone, limit], order_from_row)?;
            let mut orders = Vec::new();
            for row in rows {
                orders.push(row?);
            }
            Ok(orders)
        })
        .await
        .map_err(map_tr_err)
}

/// Items of one order, in insertion order.
pub async fn order_items(db: &Database, order_id: &str) -> Result<Vec<OrderItem>, SokoniError> {
    let order_id = order_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT order_id, product_name, product_description, quantity, unit_price
                 FROM order_items WHERE order_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![order_id], |row| {
                Ok(OrderItem {
                    order_id: row.get(0)?,
                    product_name: row.get(1)?,
                    product_description: row.get(2)?,
                    quantity: row.get(3)?,
                    unit_price: row.get(4)?,
                })
            })?;
            let mut items = Vec::new();
            for row in rows {
                items.push(row?);
            }
            Ok(items)
        })
        .await
        .map_err(map_tr_err)
}
