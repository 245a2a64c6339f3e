use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use crate::database::manager::{Database, DatabaseError};
use crate::database::models::{PaymentMethod, PaymentStatus, PaymentType};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardOverview {
    pub properties: i64,
    pub units: UnitMetrics,
    pub tenancies: TenancyMetrics,
    pub tenants: i64,
    pub financials: FinancialMetrics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnitMetrics {
    pub total: i64,
    pub occupied: i64,
    pub vacant: i64,
    pub maintenance: i64,
    pub occupancy_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct TenancyMetrics {
    pub total: i64,
    pub active: i64,
    pub rent_due: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct FinancialMetrics {
    pub collected_this_month: Decimal,
    pub overdue_amount: Decimal,
    pub pending_amount: Decimal,
    pub pending_count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RecentPayment {
    pub id: i64,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub status: PaymentStatus,
    pub payment_type: PaymentType,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub tenant_name: String,
    pub property_name: String,
    pub unit_number: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ExpiringLease {
    pub id: i64,
    pub end_date: NaiveDate,
    pub rent_amount: Decimal,
    pub tenant_name: String,
    pub tenant_phone: String,
    pub property_name: String,
    pub unit_number: String,
    #[sqlx(skip)]
    pub days_remaining: i64,
}

#[derive(FromRow)]
struct UnitCounts {
    total: i64,
    occupied: i64,
    vacant: i64,
    maintenance: i64,
}

/// occupied / total * 100 rounded to one decimal; 0.0 when there are no units.
pub fn occupancy_rate(occupied: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let rate = occupied as f64 / total.max(1) as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}

/// Cross-entity rollups for an owner's dashboard. Every figure is zero when
/// the owner has no matching rows.
#[derive(Clone)]
pub struct DashboardService {
    db: Database,
}

impl DashboardService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn overview(&self, owner_id: i64, today: NaiveDate) -> Result<DashboardOverview, DatabaseError> {
        let (properties, units, tenancies, tenants, financials) = futures::try_join!(
            self.property_count(owner_id),
            self.unit_counts(owner_id),
            self.tenancy_metrics(owner_id),
            self.tenant_count(owner_id),
            self.financial_metrics(owner_id, today),
        )?;

        Ok(DashboardOverview {
            properties,
            units: UnitMetrics {
                occupancy_rate: occupancy_rate(units.occupied, units.total),
                total: units.total,
                occupied: units.occupied,
                vacant: units.vacant,
                maintenance: units.maintenance,
            },
            tenancies,
            tenants,
            financials,
        })
    }

    async fn property_count(&self, owner_id: i64) -> Result<i64, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM properties WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    async fn unit_counts(&self, owner_id: i64) -> Result<UnitCounts, DatabaseError> {
        let counts = sqlx::query_as::<_, UnitCounts>(
            r#"
            SELECT COUNT(u.id) AS total,
                   COUNT(u.id) FILTER (WHERE u.status = 'occupied') AS occupied,
                   COUNT(u.id) FILTER (WHERE u.status = 'vacant') AS vacant,
                   COUNT(u.id) FILTER (WHERE u.status = 'maintenance') AS maintenance
            FROM units u
            JOIN properties p ON p.id = u.property_id
            WHERE p.owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(counts)
    }

    async fn tenancy_metrics(&self, owner_id: i64) -> Result<TenancyMetrics, DatabaseError> {
        let metrics = sqlx::query_as::<_, TenancyMetrics>(
            r#"
            SELECT COUNT(tn.id) AS total,
                   COUNT(tn.id) FILTER (WHERE tn.status = 'active') AS active,
                   COALESCE(SUM(tn.rent_amount) FILTER (WHERE tn.status = 'active'), 0) AS rent_due
            FROM tenancies tn
            JOIN units u ON u.id = tn.unit_id
            JOIN properties p ON p.id = u.property_id
            WHERE p.owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(metrics)
    }

    /// Distinct tenants reachable through the owner's tenancies.
    async fn tenant_count(&self, owner_id: i64) -> Result<i64, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(DISTINCT tn.tenant_id)
            FROM tenancies tn
            JOIN units u ON u.id = tn.unit_id
            JOIN properties p ON p.id = u.property_id
            WHERE p.owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(count)
    }

    async fn financial_metrics(&self, owner_id: i64, today: NaiveDate) -> Result<FinancialMetrics, DatabaseError> {
        let metrics = sqlx::query_as::<_, FinancialMetrics>(
            r#"
            SELECT COALESCE(SUM(pay.amount) FILTER (
                       WHERE pay.status = 'completed'
                         AND date_trunc('month', pay.payment_date) = date_trunc('month', $2::DATE)
                   ), 0) AS collected_this_month,
                   COALESCE(SUM(pay.amount) FILTER (
                       WHERE pay.status <> 'completed'
                         AND pay.due_date IS NOT NULL
                         AND pay.due_date < $2::DATE
                   ), 0) AS overdue_amount,
                   COALESCE(SUM(pay.amount) FILTER (WHERE pay.status IN ('pending', 'failed')), 0) AS pending_amount,
                   COUNT(pay.id) FILTER (WHERE pay.status IN ('pending', 'failed')) AS pending_count
            FROM payments pay
            JOIN tenancies tn ON tn.id = pay.tenancy_id
            JOIN units u ON u.id = tn.unit_id
            JOIN properties p ON p.id = u.property_id
            WHERE p.owner_id = $1
            "#,
        )
        .bind(owner_id)
        .bind(today)
        .fetch_one(self.db.pool())
        .await?;
        Ok(metrics)
    }

    pub async fn recent_payments(&self, owner_id: i64, limit: i64) -> Result<Vec<RecentPayment>, DatabaseError> {
        let payments = sqlx::query_as::<_, RecentPayment>(
            r#"
            SELECT pay.id, pay.amount, pay.payment_date, pay.due_date, pay.status,
                   pay.payment_type, pay.payment_method, pay.payment_reference,
                   TRIM(t.first_name || ' ' || t.last_name) AS tenant_name,
                   p.name AS property_name,
                   u.unit_number
            FROM payments pay
            JOIN tenancies tn ON tn.id = pay.tenancy_id
            JOIN tenants t ON t.id = tn.tenant_id
            JOIN units u ON u.id = tn.unit_id
            JOIN properties p ON p.id = u.property_id
            WHERE p.owner_id = $1
            ORDER BY pay.payment_date DESC, pay.created_at DESC, pay.id DESC
            LIMIT $2
            "#,
        )
        .bind(owner_id)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;
        Ok(payments)
    }

    /// Up to five active leases ending within `days` of `today`, soonest first.
    pub async fn expiring_leases(
        &self,
        owner_id: i64,
        days: i64,
        today: NaiveDate,
    ) -> Result<Vec<ExpiringLease>, DatabaseError> {
        let horizon = today + chrono::Duration::days(days.max(0));

        let mut leases = sqlx::query_as::<_, ExpiringLease>(
            r#"
            SELECT tn.id, tn.end_date, tn.rent_amount,
                   TRIM(t.first_name || ' ' || t.last_name) AS tenant_name,
                   t.phone AS tenant_phone,
                   p.name AS property_name,
                   u.unit_number
            FROM tenancies tn
            JOIN tenants t ON t.id = tn.tenant_id
            JOIN units u ON u.id = tn.unit_id
            JOIN properties p ON p.id = u.property_id
            WHERE p.owner_id = $1
              AND tn.status = 'active'
              AND tn.end_date IS NOT NULL
              AND tn.end_date BETWEEN $2 AND $3
            ORDER BY tn.end_date ASC, tn.id ASC
            LIMIT 5
            "#,
        )
        .bind(owner_id)
        .bind(today)
        .bind(horizon)
        .fetch_all(self.db.pool())
        .await?;

        for lease in &mut leases {
            lease.days_remaining = (lease.end_date - today).num_days();
        }
        Ok(leases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occupancy_rate_with_no_units_is_zero() {
        let rate = occupancy_rate(0, 0);
        assert_eq!(rate, 0.0);
        assert!(!rate.is_nan());
    }

    #[test]
    fn occupancy_rate_rounds_to_one_decimal() {
        assert_eq!(occupancy_rate(1, 3), 33.3);
        assert_eq!(occupancy_rate(2, 3), 66.7);
        assert_eq!(occupancy_rate(6, 6), 100.0);
        assert_eq!(occupancy_rate(0, 4), 0.0);
    }

    #[test]
    fn empty_overview_is_all_zero() {
        let overview = DashboardOverview::default();
        assert_eq!(overview.units.occupancy_rate, 0.0);
        assert_eq!(overview.tenancies.rent_due, Decimal::ZERO);
        assert_eq!(overview.financials.pending_count, 0);
    }
}
