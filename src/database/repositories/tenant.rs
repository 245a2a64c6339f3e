use sqlx::PgExecutor;

use crate::database::manager::{Database, DatabaseError};
use crate::database::models::{Tenant, TenantSummary, TenantWithStats};

#[derive(Debug, Clone, Default)]
pub struct NewTenant {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub national_id: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub employment_info: Option<String>,
}

#[derive(Clone)]
pub struct TenantRepository {
    db: Database,
}

impl TenantRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn get_all_by_owner(&self, owner_id: i64) -> Result<Vec<TenantWithStats>, DatabaseError> {
        let tenants = sqlx::query_as::<_, TenantWithStats>(
            r#"
            SELECT t.*,
                   COUNT(tn.id) AS tenancy_count,
                   COALESCE(BOOL_OR(tn.status = 'active'), FALSE) AS has_active_tenancy
            FROM tenants t
            LEFT JOIN tenancies tn ON tn.tenant_id = t.id
            WHERE t.owner_id = $1
            GROUP BY t.id
            ORDER BY t.created_at DESC, t.id DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(self.db.pool())
        .await?;
        Ok(tenants)
    }

    pub async fn get_summary(&self, owner_id: i64) -> Result<TenantSummary, DatabaseError> {
        let summary = sqlx::query_as::<_, TenantSummary>(
            r#"
            SELECT COUNT(DISTINCT t.id) AS total_tenants,
                   COUNT(DISTINCT t.id) FILTER (WHERE tn.status = 'active') AS active_tenants
            FROM tenants t
            LEFT JOIN tenancies tn ON tn.tenant_id = t.id
            WHERE t.owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(summary)
    }

    pub async fn find_by_id(&self, id: i64, owner_id: i64) -> Result<Option<Tenant>, DatabaseError> {
        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(tenant)
    }

    /// Email is the dedup key within one owner's tenant list.
    pub async fn find_by_email(
        &self,
        owner_id: i64,
        email: &str,
        except_id: Option<i64>,
    ) -> Result<Option<Tenant>, DatabaseError> {
        find_by_email(self.db.pool(), owner_id, email, except_id).await
    }

    pub async fn create(&self, owner_id: i64, new: &NewTenant) -> Result<Tenant, DatabaseError> {
        insert(self.db.pool(), owner_id, new).await
    }

    pub async fn update(&self, id: i64, owner_id: i64, changes: &NewTenant) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE tenants
            SET first_name = $3, last_name = $4, email = $5, phone = $6, national_id = $7,
                emergency_contact_name = $8, emergency_contact_phone = $9, employment_info = $10,
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(&changes.email)
        .bind(&changes.phone)
        .bind(&changes.national_id)
        .bind(&changes.emergency_contact_name)
        .bind(&changes.emergency_contact_phone)
        .bind(&changes.employment_info)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Removes the tenant with its tenancies and payments. Unit status is not
    /// touched, so a unit leased to this tenant stays occupied.
    pub async fn delete(&self, id: i64, owner_id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM tenants WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

pub async fn insert<'e, E>(executor: E, owner_id: i64, new: &NewTenant) -> Result<Tenant, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let tenant = sqlx::query_as::<_, Tenant>(
        r#"
        INSERT INTO tenants
            (owner_id, first_name, last_name, email, phone, national_id,
             emergency_contact_name, emergency_contact_phone, employment_info)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(owner_id)
    .bind(&new.first_name)
    .bind(&new.last_name)
    .bind(&new.email)
    .bind(&new.phone)
    .bind(&new.national_id)
    .bind(&new.emergency_contact_name)
    .bind(&new.emergency_contact_phone)
    .bind(&new.employment_info)
    .fetch_one(executor)
    .await?;
    Ok(tenant)
}

pub async fn find_by_email<'e, E>(
    executor: E,
    owner_id: i64,
    email: &str,
    except_id: Option<i64>,
) -> Result<Option<Tenant>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let tenant = sqlx::query_as::<_, Tenant>(
        r#"
        SELECT * FROM tenants
        WHERE owner_id = $1 AND LOWER(email) = LOWER($2) AND ($3::BIGINT IS NULL OR id <> $3)
        LIMIT 1
        "#,
    )
    .bind(owner_id)
    .bind(email)
    .bind(except_id)
    .fetch_optional(executor)
    .await?;
    Ok(tenant)
}
