use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::database::manager::{Database, DatabaseError};
use crate::database::models::{StatusChangeError, Tenancy, Tenant, UnitStatus};
use crate::database::repositories::{tenancy, tenant, unit, NewTenancy, NewTenant, NewUnit, TenancyRepository};
use crate::error::AppError;

pub const MSG_DUPLICATE_TENANT: &str = "A tenant with this email already exists";
pub const MSG_UNIT_UNAVAILABLE: &str = "Selected unit is no longer available";

#[derive(Debug, Error)]
pub enum LeasingError {
    #[error("tenant email {0} already registered")]
    DuplicateEmail(String),

    /// Unit missing or owned by someone else.
    #[error("unit {0} not found")]
    UnitNotFound(i64),

    #[error("unit {0} is not vacant")]
    UnitUnavailable(i64),

    #[error(transparent)]
    StatusChange(#[from] StatusChangeError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<LeasingError> for AppError {
    fn from(err: LeasingError) -> Self {
        match err {
            LeasingError::DuplicateEmail(_) => AppError::validation("email", MSG_DUPLICATE_TENANT),
            LeasingError::UnitNotFound(_) | LeasingError::UnitUnavailable(_) => {
                AppError::validation("unit_id", MSG_UNIT_UNAVAILABLE)
            }
            LeasingError::StatusChange(e) => AppError::validation("status", e.to_string()),
            LeasingError::Database(e) => AppError::Persistence(e),
        }
    }
}

/// Lease terms for assigning a new tenant to a unit.
#[derive(Debug, Clone)]
pub struct UnitAssignment {
    pub unit_id: i64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub rent_amount: Decimal,
    pub deposit_paid: Decimal,
    pub lease_terms: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Onboarding {
    pub tenant: Tenant,
    pub tenancy: Option<Tenancy>,
}

/// Tenancy lifecycle. Keeps unit occupancy in step with tenancy status.
#[derive(Clone)]
pub struct LeasingService {
    db: Database,
    tenancies: TenancyRepository,
}

impl LeasingService {
    pub fn new(db: Database) -> Self {
        Self {
            tenancies: TenancyRepository::new(db.clone()),
            db,
        }
    }

    /// Insert a tenant and, when an assignment is given, open an active
    /// tenancy and mark the unit occupied. The unit row is locked for the
    /// duration so two concurrent assignments cannot both succeed.
    pub async fn onboard_tenant(
        &self,
        owner_id: i64,
        new: NewTenant,
        assignment: Option<UnitAssignment>,
    ) -> Result<Onboarding, LeasingError> {
        let onboarding = self
            .db
            .transaction(move |conn| {
                Box::pin(async move {
                    if tenant::find_by_email(&mut *conn, owner_id, &new.email, None).await?.is_some() {
                        return Err(LeasingError::DuplicateEmail(new.email.clone()));
                    }

                    let Some(lease) = assignment else {
                        let created = tenant::insert(&mut *conn, owner_id, &new).await?;
                        return Ok(Onboarding {
                            tenant: created,
                            tenancy: None,
                        });
                    };

                    let Some(locked) = unit::lock_for_owner(&mut *conn, lease.unit_id, owner_id).await? else {
                        return Err(LeasingError::UnitNotFound(lease.unit_id));
                    };
                    if locked.status != UnitStatus::Vacant
                        || tenancy::get_active_by_unit(&mut *conn, locked.id).await?.is_some()
                    {
                        return Err(LeasingError::UnitUnavailable(locked.id));
                    }

                    let created = tenant::insert(&mut *conn, owner_id, &new).await?;
                    let opened = tenancy::insert(
                        &mut *conn,
                        &NewTenancy {
                            tenant_id: created.id,
                            unit_id: locked.id,
                            start_date: lease.start_date,
                            end_date: lease.end_date,
                            rent_amount: lease.rent_amount,
                            deposit_paid: lease.deposit_paid,
                            lease_terms: lease.lease_terms,
                        },
                    )
                    .await?;
                    unit::update_status(&mut *conn, locked.id, UnitStatus::Occupied).await?;

                    Ok::<_, LeasingError>(Onboarding {
                        tenant: created,
                        tenancy: Some(opened),
                    })
                })
            })
            .await?;

        match &onboarding.tenancy {
            Some(lease) => tracing::info!(
                "Tenant {} moved into unit {} (tenancy {})",
                onboarding.tenant.id,
                lease.unit_id,
                lease.id
            ),
            None => tracing::info!("Created tenant {} without a unit", onboarding.tenant.id),
        }
        Ok(onboarding)
    }

    /// Apply a form edit to an owned unit. The status change is checked
    /// against the locked row, so an assignment that commits first wins and
    /// the edit is rejected.
    pub async fn edit_unit(
        &self,
        owner_id: i64,
        unit_id: i64,
        mut changes: NewUnit,
    ) -> Result<UnitStatus, LeasingError> {
        let status = self
            .db
            .transaction(move |conn| {
                Box::pin(async move {
                    let Some(locked) = unit::lock_for_owner(&mut *conn, unit_id, owner_id).await? else {
                        return Err(LeasingError::UnitNotFound(unit_id));
                    };
                    changes.status = locked.status.manual_transition(changes.status)?;
                    unit::update(&mut *conn, locked.id, owner_id, &changes).await?;
                    Ok::<_, LeasingError>(changes.status)
                })
            })
            .await?;

        tracing::info!("Unit {} updated ({})", unit_id, status);
        Ok(status)
    }

    /// End an active lease and release its unit. `false` when the lease is
    /// unknown, not owned, or already ended.
    pub async fn end_tenancy(&self, tenancy_id: i64, owner_id: i64, end_date: NaiveDate) -> Result<bool, LeasingError> {
        Ok(self.tenancies.end_tenancy(tenancy_id, owner_id, end_date).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn unit_conflicts_surface_as_field_errors() {
        let err: AppError = LeasingError::UnitUnavailable(4).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        match err {
            AppError::Validation(errors) => assert_eq!(errors["unit_id"], MSG_UNIT_UNAVAILABLE),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn refused_status_change_maps_to_status_field() {
        match AppError::from(LeasingError::from(StatusChangeError::OccupiedLocked)) {
            AppError::Validation(errors) => {
                assert_eq!(errors["status"], "An occupied unit is released by ending its tenancy")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn duplicate_email_maps_to_email_field() {
        match AppError::from(LeasingError::DuplicateEmail("jane@example.com".into())) {
            AppError::Validation(errors) => assert_eq!(errors["email"], MSG_DUPLICATE_TENANT),
            other => panic!("unexpected {:?}", other),
        }
    }
}
