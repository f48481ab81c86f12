//! The tenant rent ledger.
//!
//! `rent_paid` only ever grows, and `rent_balance` is always `max(rent - rent_paid, 0)`. Both are updated in a
//! single statement so that concurrent settlements for the same tenant cannot lose an update.
use sqlx::SqliteConnection;

use crate::db_types::{Money, TenantBalance};

/// Credits `amount` to the tenant's ledger. Returns the new balance, or `None` if the tenant does not exist.
pub async fn apply_success(
    tenant_id: i64,
    amount: Money,
    conn: &mut SqliteConnection,
) -> Result<Option<TenantBalance>, sqlx::Error> {
    let balance = sqlx::query_as(
        r#"
            UPDATE tenants SET
                rent_paid = rent_paid + $1,
                rent_balance = MAX(rent - (rent_paid + $1), 0),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2
            RETURNING id, rent, rent_paid, rent_balance;
        "#,
    )
    .bind(amount)
    .bind(tenant_id)
    .fetch_optional(conn)
    .await?;
    Ok(balance)
}
