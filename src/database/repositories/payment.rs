use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::database::manager::{Database, DatabaseError};
use crate::database::models::{
    Payment, PaymentDetails, PaymentMethod, PaymentStatus, PaymentSummary, PaymentType, TenancyBalance,
};

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub tenancy_id: i64,
    pub amount: Decimal,
    pub payment_type: PaymentType,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub payment_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub status: PaymentStatus,
    pub notes: Option<String>,
}

const PAYMENT_DETAILS: &str = r#"
    SELECT pay.*,
           t.first_name,
           t.last_name,
           u.unit_number,
           p.name AS property_name,
           tn.rent_amount AS monthly_rent
    FROM payments pay
    JOIN tenancies tn ON tn.id = pay.tenancy_id
    JOIN tenants t ON t.id = tn.tenant_id
    JOIN units u ON u.id = tn.unit_id
    JOIN properties p ON p.id = u.property_id
"#;

#[derive(Clone)]
pub struct PaymentRepository {
    db: Database,
}

impl PaymentRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create(&self, new: &NewPayment) -> Result<Payment, DatabaseError> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments
                (tenancy_id, amount, payment_type, payment_method, payment_reference,
                 payment_date, due_date, status, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(new.tenancy_id)
        .bind(new.amount)
        .bind(new.payment_type)
        .bind(new.payment_method)
        .bind(&new.payment_reference)
        .bind(new.payment_date)
        .bind(new.due_date)
        .bind(new.status)
        .bind(&new.notes)
        .fetch_one(self.db.pool())
        .await?;
        Ok(payment)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Payment>, DatabaseError> {
        let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(payment)
    }

    pub async fn find_for_owner(&self, id: i64, owner_id: i64) -> Result<Option<PaymentDetails>, DatabaseError> {
        let sql = format!("{PAYMENT_DETAILS} WHERE pay.id = $1 AND p.owner_id = $2");
        let payment = sqlx::query_as::<_, PaymentDetails>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(payment)
    }

    /// Payment ledger for the owner, newest first.
    pub async fn get_all_by_owner(&self, owner_id: i64) -> Result<Vec<PaymentDetails>, DatabaseError> {
        let sql = format!(
            "{PAYMENT_DETAILS} WHERE p.owner_id = $1 ORDER BY pay.payment_date DESC, pay.created_at DESC, pay.id DESC"
        );
        let payments = sqlx::query_as::<_, PaymentDetails>(&sql)
            .bind(owner_id)
            .fetch_all(self.db.pool())
            .await?;
        Ok(payments)
    }

    pub async fn get_by_tenancy(&self, tenancy_id: i64, owner_id: i64) -> Result<Vec<Payment>, DatabaseError> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT pay.* FROM payments pay
            JOIN tenancies tn ON tn.id = pay.tenancy_id
            JOIN units u ON u.id = tn.unit_id
            JOIN properties p ON p.id = u.property_id
            WHERE pay.tenancy_id = $1 AND p.owner_id = $2
            ORDER BY pay.payment_date DESC, pay.created_at DESC
            "#,
        )
        .bind(tenancy_id)
        .bind(owner_id)
        .fetch_all(self.db.pool())
        .await?;
        Ok(payments)
    }

    pub async fn get_summary(&self, owner_id: i64) -> Result<PaymentSummary, DatabaseError> {
        let summary = sqlx::query_as::<_, PaymentSummary>(
            r#"
            SELECT COUNT(pay.id) AS total_payments,
                   COALESCE(SUM(pay.amount) FILTER (WHERE pay.status = 'completed'), 0) AS total_collected,
                   COALESCE(SUM(pay.amount) FILTER (WHERE pay.status = 'pending'), 0) AS pending_amount,
                   COALESCE(SUM(pay.amount) FILTER (
                       WHERE pay.status = 'completed' AND pay.payment_type = 'rent'
                   ), 0) AS rent_collected
            FROM payments pay
            JOIN tenancies tn ON tn.id = pay.tenancy_id
            JOIN units u ON u.id = tn.unit_id
            JOIN properties p ON p.id = u.property_id
            WHERE p.owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(summary)
    }

    /// Rent owed versus completed rent paid for one lease as of `today`.
    pub async fn get_tenancy_balance(
        &self,
        tenancy_id: i64,
        owner_id: i64,
        today: NaiveDate,
    ) -> Result<Option<TenancyBalance>, DatabaseError> {
        let row: Option<(NaiveDate, Decimal, Decimal)> = sqlx::query_as(
            r#"
            SELECT tn.start_date,
                   tn.rent_amount,
                   COALESCE((
                       SELECT SUM(pay.amount) FROM payments pay
                       WHERE pay.tenancy_id = tn.id
                         AND pay.status = 'completed'
                         AND pay.payment_type = 'rent'
                   ), 0)
            FROM tenancies tn
            JOIN units u ON u.id = tn.unit_id
            JOIN properties p ON p.id = u.property_id
            WHERE tn.id = $1 AND p.owner_id = $2
            "#,
        )
        .bind(tenancy_id)
        .bind(owner_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|(start, rent, paid)| TenancyBalance::compute(start, today, rent, paid)))
    }

    pub async fn update(&self, id: i64, owner_id: i64, changes: &NewPayment) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE payments pay
            SET amount = $3, payment_type = $4, payment_method = $5, payment_reference = $6,
                payment_date = $7, due_date = $8, status = $9, notes = $10, updated_at = NOW()
            FROM tenancies tn
            JOIN units u ON u.id = tn.unit_id
            JOIN properties p ON p.id = u.property_id
            WHERE pay.id = $1 AND tn.id = pay.tenancy_id AND p.owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(changes.amount)
        .bind(changes.payment_type)
        .bind(changes.payment_method)
        .bind(&changes.payment_reference)
        .bind(changes.payment_date)
        .bind(changes.due_date)
        .bind(changes.status)
        .bind(&changes.notes)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: i64, owner_id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            r#"
            DELETE FROM payments pay
            USING tenancies tn, units u, properties p
            WHERE pay.id = $1 AND tn.id = pay.tenancy_id AND u.id = tn.unit_id
              AND p.id = u.property_id AND p.owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
