use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

use super::pg_enum_strings;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "unit_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    #[default]
    Vacant,
    Occupied,
    Maintenance,
}

pg_enum_strings!(UnitStatus, "unit status", {
    Vacant => "vacant",
    Occupied => "occupied",
    Maintenance => "maintenance",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StatusChangeError {
    #[error("Units become occupied only when a tenant is assigned")]
    RequiresTenancy,
    #[error("An occupied unit is released by ending its tenancy")]
    OccupiedLocked,
}

impl UnitStatus {
    /// Status changes requested from the unit edit form. Occupancy is owned by
    /// the tenancy lifecycle, so manual edits only move between vacant and
    /// maintenance.
    pub fn manual_transition(self, requested: UnitStatus) -> Result<UnitStatus, StatusChangeError> {
        if requested == self {
            return Ok(self);
        }
        match (self, requested) {
            (UnitStatus::Occupied, _) => Err(StatusChangeError::OccupiedLocked),
            (_, UnitStatus::Occupied) => Err(StatusChangeError::RequiresTenancy),
            (_, next) => Ok(next),
        }
    }

    /// Statuses a user may pick for a unit currently in `self`.
    pub fn manual_choices(self) -> Vec<UnitStatus> {
        UnitStatus::ALL
            .iter()
            .copied()
            .filter(|s| self.manual_transition(*s).is_ok())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Unit {
    pub id: i64,
    pub property_id: i64,
    pub unit_number: String,
    pub bedrooms: i32,
    pub bathrooms: Decimal,
    pub square_feet: Option<i32>,
    pub rent_amount: Decimal,
    pub deposit_amount: Decimal,
    pub status: UnitStatus,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UnitWithProperty {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub unit: Unit,
    pub property_name: String,
    pub property_address: String,
    pub property_city: String,
}

/// Totals shown above a unit listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitSummary {
    pub total: i64,
    pub vacant: i64,
    pub occupied: i64,
    pub maintenance: i64,
    pub total_rent: Decimal,
    pub avg_rent: Decimal,
}

impl UnitSummary {
    pub fn from_units<'a>(units: impl IntoIterator<Item = &'a Unit>) -> Self {
        let mut summary = UnitSummary::default();
        for unit in units {
            summary.total += 1;
            summary.total_rent += unit.rent_amount;
            match unit.status {
                UnitStatus::Vacant => summary.vacant += 1,
                UnitStatus::Occupied => summary.occupied += 1,
                UnitStatus::Maintenance => summary.maintenance += 1,
            }
        }
        if summary.total > 0 {
            summary.avg_rent = (summary.total_rent / Decimal::from(summary.total)).round_dp(2);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vacant_and_maintenance_swap_freely() {
        assert_eq!(
            UnitStatus::Vacant.manual_transition(UnitStatus::Maintenance),
            Ok(UnitStatus::Maintenance)
        );
        assert_eq!(
            UnitStatus::Maintenance.manual_transition(UnitStatus::Vacant),
            Ok(UnitStatus::Vacant)
        );
    }

    #[test]
    fn occupied_is_not_reachable_by_hand() {
        assert_eq!(
            UnitStatus::Vacant.manual_transition(UnitStatus::Occupied),
            Err(StatusChangeError::RequiresTenancy)
        );
        assert_eq!(
            UnitStatus::Occupied.manual_transition(UnitStatus::Vacant),
            Err(StatusChangeError::OccupiedLocked)
        );
        assert_eq!(
            UnitStatus::Occupied.manual_transition(UnitStatus::Occupied),
            Ok(UnitStatus::Occupied)
        );
    }

    #[test]
    fn manual_choices_follow_transitions() {
        assert_eq!(
            UnitStatus::Vacant.manual_choices(),
            vec![UnitStatus::Vacant, UnitStatus::Maintenance]
        );
        assert_eq!(UnitStatus::Occupied.manual_choices(), vec![UnitStatus::Occupied]);
    }

    fn unit(status: UnitStatus, rent: i64) -> Unit {
        let now = Utc::now();
        Unit {
            id: 0,
            property_id: 1,
            unit_number: "F1-U01".into(),
            bedrooms: 1,
            bathrooms: Decimal::ONE,
            square_feet: None,
            rent_amount: Decimal::from(rent),
            deposit_amount: Decimal::ZERO,
            status,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn empty_listing_is_all_zero() {
        let summary = UnitSummary::from_units(&[]);
        assert_eq!(summary, UnitSummary::default());
        assert_eq!(summary.avg_rent, Decimal::ZERO);
    }

    #[test]
    fn counts_by_status_and_averages_rent() {
        let units = vec![
            unit(UnitStatus::Vacant, 10000),
            unit(UnitStatus::Occupied, 15000),
            unit(UnitStatus::Occupied, 20000),
            unit(UnitStatus::Maintenance, 5000),
        ];
        let summary = UnitSummary::from_units(&units);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.vacant, 1);
        assert_eq!(summary.occupied, 2);
        assert_eq!(summary.maintenance, 1);
        assert_eq!(summary.total_rent, Decimal::from(50000));
        assert_eq!(summary.avg_rent, Decimal::from(12500));
    }
}
