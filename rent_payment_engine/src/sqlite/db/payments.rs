use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPayment, Payment},
    traits::PaymentGatewayError,
};

/// Inserts a `Success` payment. A receipt that has already been recorded is reported as
/// [`PaymentGatewayError::PaymentAlreadyExists`], and the connection is left usable (only the statement is aborted).
pub async fn insert(payment: NewPayment, conn: &mut SqliteConnection) -> Result<Payment, PaymentGatewayError> {
    let receipt = payment.receipt.clone();
    let payment = sqlx::query_as(
        r#"
            INSERT INTO payments (tenant_id, checkout_request_id, amount, phone, receipt, transaction_date, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'Success')
            RETURNING *;
        "#,
    )
    .bind(payment.tenant_id)
    .bind(payment.checkout_request_id)
    .bind(payment.amount)
    .bind(payment.phone)
    .bind(payment.receipt)
    .bind(payment.transaction_date)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => PaymentGatewayError::PaymentAlreadyExists(receipt),
        _ => PaymentGatewayError::from(e),
    })?;
    Ok(payment)
}

pub async fn fetch_by_receipt(receipt: &str, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    let payment =
        sqlx::query_as("SELECT * FROM payments WHERE receipt = $1").bind(receipt).fetch_optional(conn).await?;
    Ok(payment)
}

pub async fn fetch_for_tenant(tenant_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Payment>, sqlx::Error> {
    let payments = sqlx::query_as("SELECT * FROM payments WHERE tenant_id = $1 ORDER BY transaction_date DESC, id DESC")
        .bind(tenant_id)
        .fetch_all(conn)
        .await?;
    Ok(payments)
}

pub async fn fetch_unassigned(conn: &mut SqliteConnection) -> Result<Vec<Payment>, sqlx::Error> {
    let payments =
        sqlx::query_as("SELECT * FROM payments WHERE tenant_id IS NULL ORDER BY transaction_date DESC, id DESC")
            .fetch_all(conn)
            .await?;
    Ok(payments)
}
