use rust_decimal::Decimal;
use sqlx::PgExecutor;

use crate::database::manager::{Database, DatabaseError};
use crate::database::models::{Unit, UnitStatus, UnitWithProperty};

#[derive(Debug, Clone)]
pub struct NewUnit {
    pub unit_number: String,
    pub bedrooms: i32,
    pub bathrooms: Decimal,
    pub square_feet: Option<i32>,
    pub rent_amount: Decimal,
    pub deposit_amount: Decimal,
    pub status: UnitStatus,
    pub description: Option<String>,
}

impl Default for NewUnit {
    fn default() -> Self {
        Self {
            unit_number: String::new(),
            bedrooms: 1,
            bathrooms: Decimal::ONE,
            square_feet: None,
            rent_amount: Decimal::ZERO,
            deposit_amount: Decimal::ZERO,
            status: UnitStatus::Vacant,
            description: None,
        }
    }
}

const UNIT_WITH_PROPERTY: &str = r#"
    SELECT u.*, p.name AS property_name, p.address AS property_address, p.city AS property_city
    FROM units u
    JOIN properties p ON p.id = u.property_id
"#;

#[derive(Clone)]
pub struct UnitRepository {
    db: Database,
}

impl UnitRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create(&self, property_id: i64, new: &NewUnit) -> Result<Unit, DatabaseError> {
        insert(self.db.pool(), property_id, new).await
    }

    /// Insert every unit or none. An empty batch is a no-op.
    pub async fn bulk_create(&self, property_id: i64, units: Vec<NewUnit>) -> Result<Vec<Unit>, DatabaseError> {
        if units.is_empty() {
            return Ok(Vec::new());
        }

        let created = self
            .db
            .transaction(move |conn| {
                Box::pin(async move {
                    let mut created = Vec::with_capacity(units.len());
                    for new_unit in &units {
                        created.push(insert(&mut *conn, property_id, new_unit).await?);
                    }
                    Ok::<_, DatabaseError>(created)
                })
            })
            .await?;

        tracing::debug!("Created {} units for property {}", created.len(), property_id);
        Ok(created)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Unit>, DatabaseError> {
        let unit = sqlx::query_as::<_, Unit>("SELECT * FROM units WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(unit)
    }

    /// Unit lookup through the ownership chain.
    pub async fn find_for_owner(&self, id: i64, owner_id: i64) -> Result<Option<UnitWithProperty>, DatabaseError> {
        let sql = format!("{UNIT_WITH_PROPERTY} WHERE u.id = $1 AND p.owner_id = $2");
        let unit = sqlx::query_as::<_, UnitWithProperty>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(unit)
    }

    pub async fn get_all_by_property(&self, property_id: i64) -> Result<Vec<Unit>, DatabaseError> {
        let units = sqlx::query_as::<_, Unit>("SELECT * FROM units WHERE property_id = $1 ORDER BY unit_number")
            .bind(property_id)
            .fetch_all(self.db.pool())
            .await?;
        Ok(units)
    }

    /// All units the owner can see, optionally narrowed to one property.
    pub async fn get_all_by_owner(
        &self,
        owner_id: i64,
        property_id: Option<i64>,
    ) -> Result<Vec<UnitWithProperty>, DatabaseError> {
        let sql = format!(
            "{UNIT_WITH_PROPERTY} WHERE p.owner_id = $1 AND ($2::BIGINT IS NULL OR p.id = $2) ORDER BY p.name, u.unit_number"
        );
        let units = sqlx::query_as::<_, UnitWithProperty>(&sql)
            .bind(owner_id)
            .bind(property_id)
            .fetch_all(self.db.pool())
            .await?;
        Ok(units)
    }

    pub async fn get_vacant_units_by_owner(&self, owner_id: i64) -> Result<Vec<UnitWithProperty>, DatabaseError> {
        let sql = format!(
            "{UNIT_WITH_PROPERTY} WHERE p.owner_id = $1 AND u.status = 'vacant' ORDER BY p.name, u.unit_number"
        );
        let units = sqlx::query_as::<_, UnitWithProperty>(&sql)
            .bind(owner_id)
            .fetch_all(self.db.pool())
            .await?;
        Ok(units)
    }

    /// Owner-scoped update of every editable column including status, with
    /// no transition check. Form edits go through `LeasingService::edit_unit`.
    pub async fn update(&self, id: i64, owner_id: i64, changes: &NewUnit) -> Result<bool, DatabaseError> {
        update(self.db.pool(), id, owner_id, changes).await
    }

    pub async fn update_status(&self, id: i64, status: UnitStatus) -> Result<bool, DatabaseError> {
        update_status(self.db.pool(), id, status).await
    }

    /// Owner-scoped delete. Tenancies and payments on the unit cascade.
    pub async fn delete(&self, id: i64, owner_id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "DELETE FROM units u USING properties p WHERE u.id = $1 AND p.id = u.property_id AND p.owner_id = $2",
        )
        .bind(id)
        .bind(owner_id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

pub async fn insert<'e, E>(executor: E, property_id: i64, new: &NewUnit) -> Result<Unit, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let unit = sqlx::query_as::<_, Unit>(
        r#"
        INSERT INTO units
            (property_id, unit_number, bedrooms, bathrooms, square_feet, rent_amount, deposit_amount, status, description)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(property_id)
    .bind(&new.unit_number)
    .bind(new.bedrooms)
    .bind(new.bathrooms)
    .bind(new.square_feet)
    .bind(new.rent_amount)
    .bind(new.deposit_amount)
    .bind(new.status)
    .bind(&new.description)
    .fetch_one(executor)
    .await?;
    Ok(unit)
}

pub async fn update<'e, E>(executor: E, id: i64, owner_id: i64, changes: &NewUnit) -> Result<bool, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE units u
        SET unit_number = $3, bedrooms = $4, bathrooms = $5, square_feet = $6,
            rent_amount = $7, deposit_amount = $8, status = $9, description = $10,
            updated_at = NOW()
        FROM properties p
        WHERE u.id = $1 AND p.id = u.property_id AND p.owner_id = $2
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .bind(&changes.unit_number)
    .bind(changes.bedrooms)
    .bind(changes.bathrooms)
    .bind(changes.square_feet)
    .bind(changes.rent_amount)
    .bind(changes.deposit_amount)
    .bind(changes.status)
    .bind(&changes.description)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_status<'e, E>(executor: E, id: i64, status: UnitStatus) -> Result<bool, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("UPDATE units SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Row-lock an owned unit for the rest of the transaction.
pub async fn lock_for_owner<'e, E>(executor: E, id: i64, owner_id: i64) -> Result<Option<Unit>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let unit = sqlx::query_as::<_, Unit>(
        r#"
        SELECT u.* FROM units u
        JOIN properties p ON p.id = u.property_id
        WHERE u.id = $1 AND p.owner_id = $2
        FOR UPDATE OF u
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .fetch_optional(executor)
    .await?;
    Ok(unit)
}
