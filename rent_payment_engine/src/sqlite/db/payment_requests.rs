use chrono::Duration;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPaymentRequest, PaymentRequest},
    traits::PaymentGatewayError,
};

/// Stores a new `Pending` request. The checkout request id must not have been seen before.
pub async fn insert(request: NewPaymentRequest, conn: &mut SqliteConnection) -> Result<PaymentRequest, PaymentGatewayError> {
    let checkout_id = request.checkout_request_id.clone();
    let request: PaymentRequest = sqlx::query_as(
        r#"
            INSERT INTO payment_requests (tenant_id, amount, phone, checkout_request_id, merchant_request_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(request.tenant_id)
    .bind(request.amount)
    .bind(request.phone)
    .bind(request.checkout_request_id)
    .bind(request.merchant_request_id)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => {
            PaymentGatewayError::PaymentRequestAlreadyExists(checkout_id)
        },
        sqlx::Error::Database(err) if err.is_foreign_key_violation() => {
            PaymentGatewayError::InvalidRequest(format!("Unknown tenant. {err}"))
        },
        _ => PaymentGatewayError::from(e),
    })?;
    debug!("🗃️ Payment request #{} [{}] saved as Pending", request.id, request.checkout_request_id);
    Ok(request)
}

pub async fn fetch_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<PaymentRequest>, sqlx::Error> {
    let request =
        sqlx::query_as("SELECT * FROM payment_requests WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(request)
}

pub async fn fetch_by_checkout_id(
    checkout_request_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentRequest>, sqlx::Error> {
    let request = sqlx::query_as("SELECT * FROM payment_requests WHERE checkout_request_id = $1")
        .bind(checkout_request_id)
        .fetch_optional(conn)
        .await?;
    Ok(request)
}

/// Moves the request from `Pending` to `Failed`. Returns `None` if the request does not exist or is not `Pending`.
pub async fn fail_if_pending(
    checkout_request_id: &str,
    result_desc: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentRequest>, sqlx::Error> {
    let request = sqlx::query_as(
        r#"
            UPDATE payment_requests SET status = 'Failed', result_desc = $1, updated_at = CURRENT_TIMESTAMP
            WHERE checkout_request_id = $2 AND status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(result_desc)
    .bind(checkout_request_id)
    .fetch_optional(conn)
    .await?;
    Ok(request)
}

/// Moves the request from `Pending` to `Completed`. Returns `None` if the request does not exist or is not `Pending`.
pub async fn complete_if_pending(
    checkout_request_id: &str,
    result_desc: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentRequest>, sqlx::Error> {
    let request = sqlx::query_as(
        r#"
            UPDATE payment_requests SET status = 'Completed', result_desc = $1, updated_at = CURRENT_TIMESTAMP
            WHERE checkout_request_id = $2 AND status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(result_desc)
    .bind(checkout_request_id)
    .fetch_optional(conn)
    .await?;
    Ok(request)
}

pub(crate) async fn expire_pending(
    limit: Duration,
    reason: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<PaymentRequest>, sqlx::Error> {
    let rows = sqlx::query_as(
        r#"
            UPDATE payment_requests SET status = 'Failed', result_desc = $1, updated_at = CURRENT_TIMESTAMP
            WHERE status = 'Pending' AND (unixepoch(CURRENT_TIMESTAMP) - unixepoch(created_at)) >= $2
            RETURNING *;
        "#,
    )
    .bind(reason)
    .bind(limit.num_seconds())
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
