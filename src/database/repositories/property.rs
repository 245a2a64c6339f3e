use sqlx::PgExecutor;

use crate::database::manager::{Database, DatabaseError};
use crate::database::models::{Property, PropertySummary, PropertyType, PropertyWithStats, Unit};
use crate::database::repositories::unit::{self, NewUnit};

#[derive(Debug, Clone)]
pub struct NewProperty {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub property_type: PropertyType,
    pub total_units: i32,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct PropertyRepository {
    db: Database,
}

impl PropertyRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Owner's properties, newest first, each with aggregates over its units.
    pub async fn get_all_by_owner(&self, owner_id: i64) -> Result<Vec<PropertyWithStats>, DatabaseError> {
        let rows = sqlx::query_as::<_, PropertyWithStats>(
            r#"
            SELECT p.*,
                   COUNT(u.id) AS units_count,
                   COUNT(u.id) FILTER (WHERE u.status = 'occupied') AS occupied_units,
                   COUNT(u.id) FILTER (WHERE u.status = 'vacant') AS vacant_units,
                   COUNT(u.id) FILTER (WHERE u.status = 'maintenance') AS maintenance_units,
                   COALESCE(SUM(u.rent_amount), 0) AS total_rent_roll,
                   ROUND(COALESCE(AVG(u.rent_amount), 0), 2) AS avg_rent
            FROM properties p
            LEFT JOIN units u ON u.property_id = p.id
            WHERE p.owner_id = $1
            GROUP BY p.id
            ORDER BY p.created_at DESC, p.id DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows)
    }

    pub async fn get_summary(&self, owner_id: i64) -> Result<PropertySummary, DatabaseError> {
        let summary = sqlx::query_as::<_, PropertySummary>(
            r#"
            SELECT COUNT(*) AS total_properties,
                   COALESCE(SUM(total_units), 0)::BIGINT AS declared_units
            FROM properties
            WHERE owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(summary)
    }

    pub async fn find_by_id(&self, id: i64, owner_id: i64) -> Result<Option<Property>, DatabaseError> {
        find_for_owner(self.db.pool(), id, owner_id).await
    }

    pub async fn create(&self, owner_id: i64, new: &NewProperty) -> Result<Property, DatabaseError> {
        insert(self.db.pool(), owner_id, new).await
    }

    /// Create the property and its generated units together; either all rows
    /// land or none do.
    pub async fn create_with_units(
        &self,
        owner_id: i64,
        new: NewProperty,
        units: Vec<NewUnit>,
    ) -> Result<(Property, Vec<Unit>), DatabaseError> {
        self.db
            .transaction(move |conn| {
                Box::pin(async move {
                    let property = insert(&mut *conn, owner_id, &new).await?;
                    let mut created = Vec::with_capacity(units.len());
                    for new_unit in &units {
                        created.push(unit::insert(&mut *conn, property.id, new_unit).await?);
                    }
                    Ok::<_, DatabaseError>((property, created))
                })
            })
            .await
    }

    pub async fn update(&self, id: i64, owner_id: i64, changes: &NewProperty) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE properties
            SET name = $3, address = $4, city = $5, state = $6, postal_code = $7,
                country = $8, property_type = $9, total_units = $10, description = $11,
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(&changes.name)
        .bind(&changes.address)
        .bind(&changes.city)
        .bind(&changes.state)
        .bind(&changes.postal_code)
        .bind(&changes.country)
        .bind(changes.property_type)
        .bind(changes.total_units)
        .bind(&changes.description)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a property and its units in one transaction. A property owned by
    /// someone else is left untouched and reported as `false`.
    pub async fn delete(&self, id: i64, owner_id: i64) -> Result<bool, DatabaseError> {
        self.db
            .transaction(move |conn| {
                Box::pin(async move {
                    sqlx::query(
                        r#"
                        DELETE FROM units
                        WHERE property_id = $1
                          AND EXISTS (SELECT 1 FROM properties WHERE id = $1 AND owner_id = $2)
                        "#,
                    )
                    .bind(id)
                    .bind(owner_id)
                    .execute(&mut *conn)
                    .await?;

                    let result = sqlx::query("DELETE FROM properties WHERE id = $1 AND owner_id = $2")
                        .bind(id)
                        .bind(owner_id)
                        .execute(&mut *conn)
                        .await?;
                    Ok::<_, DatabaseError>(result.rows_affected() > 0)
                })
            })
            .await
    }
}

pub async fn insert<'e, E>(executor: E, owner_id: i64, new: &NewProperty) -> Result<Property, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let property = sqlx::query_as::<_, Property>(
        r#"
        INSERT INTO properties
            (owner_id, name, address, city, state, postal_code, country, property_type, total_units, description)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(owner_id)
    .bind(&new.name)
    .bind(&new.address)
    .bind(&new.city)
    .bind(&new.state)
    .bind(&new.postal_code)
    .bind(&new.country)
    .bind(new.property_type)
    .bind(new.total_units)
    .bind(&new.description)
    .fetch_one(executor)
    .await?;
    Ok(property)
}

pub async fn find_for_owner<'e, E>(executor: E, id: i64, owner_id: i64) -> Result<Option<Property>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let property = sqlx::query_as::<_, Property>("SELECT * FROM properties WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner_id)
        .fetch_optional(executor)
        .await?;
    Ok(property)
}
