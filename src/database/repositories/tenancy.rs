use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgExecutor;

use crate::database::manager::{Database, DatabaseError};
use crate::database::models::{Tenancy, TenancyDetails, TenancyStatus, UnitStatus};
use crate::database::repositories::unit;

#[derive(Debug, Clone)]
pub struct NewTenancy {
    pub tenant_id: i64,
    pub unit_id: i64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub rent_amount: Decimal,
    pub deposit_paid: Decimal,
    pub lease_terms: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TenancyUpdate {
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub rent_amount: Decimal,
    pub deposit_paid: Decimal,
    pub lease_terms: Option<String>,
}

const TENANCY_DETAILS: &str = r#"
    SELECT tn.*,
           u.unit_number,
           p.id AS property_id,
           p.name AS property_name,
           t.first_name AS tenant_first_name,
           t.last_name AS tenant_last_name
    FROM tenancies tn
    JOIN units u ON u.id = tn.unit_id
    JOIN properties p ON p.id = u.property_id
    JOIN tenants t ON t.id = tn.tenant_id
"#;

#[derive(Clone)]
pub struct TenancyRepository {
    db: Database,
}

impl TenancyRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create(&self, new: &NewTenancy) -> Result<Tenancy, DatabaseError> {
        insert(self.db.pool(), new).await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Tenancy>, DatabaseError> {
        let tenancy = sqlx::query_as::<_, Tenancy>("SELECT * FROM tenancies WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(tenancy)
    }

    pub async fn find_for_owner(&self, id: i64, owner_id: i64) -> Result<Option<TenancyDetails>, DatabaseError> {
        let sql = format!("{TENANCY_DETAILS} WHERE tn.id = $1 AND p.owner_id = $2");
        let tenancy = sqlx::query_as::<_, TenancyDetails>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(tenancy)
    }

    /// Lease history for one tenant, most recent start first.
    pub async fn get_by_tenant(&self, tenant_id: i64, owner_id: i64) -> Result<Vec<TenancyDetails>, DatabaseError> {
        let sql = format!(
            "{TENANCY_DETAILS} WHERE tn.tenant_id = $1 AND p.owner_id = $2 ORDER BY tn.start_date DESC, tn.id DESC"
        );
        let tenancies = sqlx::query_as::<_, TenancyDetails>(&sql)
            .bind(tenant_id)
            .bind(owner_id)
            .fetch_all(self.db.pool())
            .await?;
        Ok(tenancies)
    }

    pub async fn get_active_by_unit(&self, unit_id: i64) -> Result<Option<Tenancy>, DatabaseError> {
        get_active_by_unit(self.db.pool(), unit_id).await
    }

    /// Active leases across the owner's portfolio; feeds the payment form.
    pub async fn get_active_by_owner(&self, owner_id: i64) -> Result<Vec<TenancyDetails>, DatabaseError> {
        let sql = format!(
            "{TENANCY_DETAILS} WHERE p.owner_id = $1 AND tn.status = 'active' ORDER BY p.name, u.unit_number"
        );
        let tenancies = sqlx::query_as::<_, TenancyDetails>(&sql)
            .bind(owner_id)
            .fetch_all(self.db.pool())
            .await?;
        Ok(tenancies)
    }

    pub async fn update(&self, id: i64, owner_id: i64, changes: &TenancyUpdate) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE tenancies tn
            SET start_date = $3, end_date = $4, rent_amount = $5, deposit_paid = $6,
                lease_terms = $7, updated_at = NOW()
            FROM units u
            JOIN properties p ON p.id = u.property_id
            WHERE tn.id = $1 AND u.id = tn.unit_id AND p.owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(changes.start_date)
        .bind(changes.end_date)
        .bind(changes.rent_amount)
        .bind(changes.deposit_paid)
        .bind(&changes.lease_terms)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// End an active lease and release its unit in one transaction. Returns
    /// `false` when the lease is unknown, not owned, or already ended.
    pub async fn end_tenancy(&self, id: i64, owner_id: i64, end_date: NaiveDate) -> Result<bool, DatabaseError> {
        self.db
            .transaction(move |conn| {
                Box::pin(async move {
                    let ended: Option<(i64,)> = sqlx::query_as(
                        r#"
                        UPDATE tenancies tn
                        SET status = $3, end_date = $4, updated_at = NOW()
                        FROM units u
                        JOIN properties p ON p.id = u.property_id
                        WHERE tn.id = $1 AND u.id = tn.unit_id AND p.owner_id = $2
                          AND tn.status = 'active'
                        RETURNING tn.unit_id
                        "#,
                    )
                    .bind(id)
                    .bind(owner_id)
                    .bind(TenancyStatus::Ended)
                    .bind(end_date)
                    .fetch_optional(&mut *conn)
                    .await?;

                    let Some((unit_id,)) = ended else {
                        return Ok(false);
                    };

                    unit::update_status(&mut *conn, unit_id, UnitStatus::Vacant).await?;
                    tracing::info!("Ended tenancy {} and released unit {}", id, unit_id);
                    Ok::<_, DatabaseError>(true)
                })
            })
            .await
    }

    pub async fn delete(&self, id: i64, owner_id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            r#"
            DELETE FROM tenancies tn
            USING units u, properties p
            WHERE tn.id = $1 AND u.id = tn.unit_id AND p.id = u.property_id AND p.owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

pub async fn insert<'e, E>(executor: E, new: &NewTenancy) -> Result<Tenancy, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let tenancy = sqlx::query_as::<_, Tenancy>(
        r#"
        INSERT INTO tenancies
            (tenant_id, unit_id, start_date, end_date, rent_amount, deposit_paid, status, lease_terms)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(new.tenant_id)
    .bind(new.unit_id)
    .bind(new.start_date)
    .bind(new.end_date)
    .bind(new.rent_amount)
    .bind(new.deposit_paid)
    .bind(TenancyStatus::Active)
    .bind(&new.lease_terms)
    .fetch_one(executor)
    .await?;
    Ok(tenancy)
}

pub async fn get_active_by_unit<'e, E>(executor: E, unit_id: i64) -> Result<Option<Tenancy>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let tenancy = sqlx::query_as::<_, Tenancy>(
        "SELECT * FROM tenancies WHERE unit_id = $1 AND status = 'active' ORDER BY start_date DESC LIMIT 1",
    )
    .bind(unit_id)
    .fetch_optional(executor)
    .await?;
    Ok(tenancy)
}
