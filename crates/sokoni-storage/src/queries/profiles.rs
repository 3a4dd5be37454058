// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credit balance operations on user profiles.

use rusqlite::params;
use sokoni_core::{CreditBalance, SokoniError};

use crate::database::{map_tr_err, Database};

/// Current balance for a user, `None` if no profile row exists.
pub async fn credit_balance(
    db: &Database,
    user_id: &str,
) -> Result<Option<CreditBalance>, SokoniError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, credits_balance, credits_used_month
                 FROM profiles WHERE user_id = ?1",
            )?;
            let mut rows = stmt.query_map(params![user_id], |row| {
                Ok(CreditBalance {
                    user_id: row.get(0)?,
                    balance: row.get(1)?,
                    used_this_month: row.get(2)?,
                })
            })?;
            match rows.next() {
                Some(row) => Ok(Some(row?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Deduct `amount` credits if the balance covers it.
///
/// The guard and the write are one UPDATE statement, so concurrent
/// deductions can never drive the balance negative. Returns whether the
/// deduction happened.
pub async fn deduct_credits(
    db: &Database,
    user_id: &str,
    amount: i64,
) -> Result<bool, SokoniError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE profiles
                 SET credits_balance = credits_balance - ?2,
                     credits_used_month = credits_used_month + ?2
                 WHERE user_id = ?1 AND credits_balance >= ?2",
                params![user_id, amount],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Create or top up a profile. Billing belongs to the companion web app;
/// this exists for fixtures and operational tooling.
pub async fn upsert_profile(db: &Database, user_id: &str, balance: i64) -> Result<(), SokoniError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO profiles (user_id, credits_balance) VALUES (?1, ?2)
                 ON CONFLICT (user_id) DO UPDATE SET credits_balance = ?2",
                params![user_id, balance],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn deduction_respects_the_balance() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("t.db").to_str().unwrap())
            .await
            .unwrap();
        upsert_profile(&db, "user-1", 5).await.unwrap();

        assert!(deduct_credits(&db, "user-1", 5).await.unwrap());
        // Balance is now zero; nothing more can be taken.
        assert!(!deduct_credits(&db, "user-1", 1).await.unwrap());

        let balance = credit_balance(&db, "user-1").await.unwrap().unwrap();
        assert_eq!(balance.balance, 0);
        assert_eq!(balance.used_this_month, 5);
    }

    #[tokio::test]
    async fn missing_profile_deducts_nothing() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("t.db").to_str().unwrap())
            .await
            .unwrap();
        assert!(!deduct_credits(&db, "ghost", 1).await.unwrap());
        assert!(credit_balance(&db, "ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_deductions_never_go_negative() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("t.db").to_str().unwrap())
            .await
            .unwrap();
        upsert_profile(&db, "user-1", 10).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let db = db.clone();
            handles.push(tokio::spawn(
                async move { deduct_credits(&db, "user-1", 1).await },
            ));
        }
        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() {
                succeeded += 1;
            }
        }
        assert_eq!(succeeded, 10);
        let balance = credit_balance(&db, "user-1").await.unwrap().unwrap();
        assert_eq!(balance.balance, 0);
    }
}
