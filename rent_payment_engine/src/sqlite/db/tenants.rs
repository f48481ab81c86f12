use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewTenant, Tenant, TenantBalance},
    traits::TenantApiError,
};

pub async fn insert_tenant(tenant: NewTenant, conn: &mut SqliteConnection) -> Result<Tenant, TenantApiError> {
    if tenant.rent.value() < 0 {
        return Err(TenantApiError::InvalidTenant(format!("Rent cannot be negative: {}", tenant.rent)));
    }
    let tenant = sqlx::query_as(
        r#"
            INSERT INTO tenants (name, phone, rent, rent_paid, rent_balance, active)
            VALUES ($1, $2, $3, 0, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(tenant.name)
    .bind(tenant.phone)
    .bind(tenant.rent)
    .bind(tenant.active)
    .fetch_one(conn)
    .await?;
    Ok(tenant)
}

pub async fn fetch_tenant(id: i64, conn: &mut SqliteConnection) -> Result<Option<Tenant>, sqlx::Error> {
    let tenant = sqlx::query_as("SELECT * FROM tenants WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(tenant)
}

pub async fn fetch_balance(id: i64, conn: &mut SqliteConnection) -> Result<Option<TenantBalance>, sqlx::Error> {
    let balance = sqlx::query_as("SELECT id, rent, rent_paid, rent_balance FROM tenants WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(balance)
}

/// Active tenants whose stored phone is one of `phones`.
pub async fn fetch_active_by_phone(phones: &[String], conn: &mut SqliteConnection) -> Result<Vec<Tenant>, sqlx::Error> {
    if phones.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::new("SELECT * FROM tenants WHERE active = 1 AND phone IN (");
    let mut separated = builder.separated(", ");
    for phone in phones {
        separated.push_bind(phone);
    }
    separated.push_unseparated(") ORDER BY id");
    let tenants = builder.build_query_as::<Tenant>().fetch_all(conn).await?;
    Ok(tenants)
}
