use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::pg_enum_strings;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "tenancy_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TenancyStatus {
    #[default]
    Active,
    Ended,
}

pg_enum_strings!(TenancyStatus, "tenancy status", {
    Active => "active",
    Ended => "ended",
});

/// A lease. `rent_amount` is a snapshot taken at signing and does not follow
/// later changes to the unit's rent.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tenancy {
    pub id: i64,
    pub tenant_id: i64,
    pub unit_id: i64,
    pub start_date: NaiveDate,
    /// `None` means month-to-month.
    pub end_date: Option<NaiveDate>,
    pub rent_amount: Decimal,
    pub deposit_paid: Decimal,
    pub status: TenancyStatus,
    pub lease_terms: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenancy {
    pub fn is_active(&self) -> bool {
        self.status == TenancyStatus::Active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TenancyDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub tenancy: Tenancy,
    pub unit_number: String,
    pub property_id: i64,
    pub property_name: String,
    pub tenant_first_name: String,
    pub tenant_last_name: String,
}

impl TenancyDetails {
    pub fn tenant_name(&self) -> String {
        format!("{} {}", self.tenant_first_name, self.tenant_last_name)
            .trim()
            .to_string()
    }
}
