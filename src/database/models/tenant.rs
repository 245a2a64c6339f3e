use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    pub id: i64,
    /// Managing user; tenants without a tenancy stay owner-scoped through it.
    pub owner_id: i64,
    pub user_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub national_id: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub employment_info: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TenantWithStats {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub tenant: Tenant,
    pub tenancy_count: i64,
    pub has_active_tenancy: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct TenantSummary {
    pub total_tenants: i64,
    pub active_tenants: i64,
}
