use rust_decimal::Decimal;

use crate::database::manager::Database;
use crate::database::models::{Property, Unit, UnitStatus};
use crate::database::repositories::{NewProperty, NewUnit, PropertyRepository};
use crate::error::AppError;

/// Building layout used to generate units when a property is created.
#[derive(Debug, Clone, PartialEq)]
pub struct FloorPlan {
    pub floors: u32,
    pub units_per_floor: u32,
    pub rent_amount: Decimal,
    pub deposit_amount: Decimal,
    pub bedrooms: i32,
    pub bathrooms: Decimal,
}

impl Default for FloorPlan {
    fn default() -> Self {
        Self {
            floors: 1,
            units_per_floor: 1,
            rent_amount: Decimal::ZERO,
            deposit_amount: Decimal::ZERO,
            bedrooms: 1,
            bathrooms: Decimal::ONE,
        }
    }
}

impl FloorPlan {
    pub const MAX_FLOORS: u32 = 200;
    pub const MAX_UNITS_PER_FLOOR: u32 = 100;

    pub fn within_limits(&self) -> bool {
        (1..=Self::MAX_FLOORS).contains(&self.floors) && (1..=Self::MAX_UNITS_PER_FLOOR).contains(&self.units_per_floor)
    }

    /// `None` when the product does not fit a unit count.
    pub fn total_units(&self) -> Option<i32> {
        self.floors
            .checked_mul(self.units_per_floor)
            .and_then(|total| i32::try_from(total).ok())
    }

    /// `F{floor}-U{nn}` in floor-major order.
    pub fn unit_numbers(&self) -> Vec<String> {
        (1..=self.floors)
            .flat_map(|floor| (1..=self.units_per_floor).map(move |n| format!("F{}-U{:02}", floor, n)))
            .collect()
    }

    /// Vacant units carrying the plan's defaults.
    pub fn units(&self) -> Vec<NewUnit> {
        self.unit_numbers()
            .into_iter()
            .map(|unit_number| NewUnit {
                unit_number,
                bedrooms: self.bedrooms,
                bathrooms: self.bathrooms,
                square_feet: None,
                rent_amount: self.rent_amount,
                deposit_amount: self.deposit_amount,
                status: UnitStatus::Vacant,
                description: None,
            })
            .collect()
    }
}

#[derive(Clone)]
pub struct PropertyService {
    properties: PropertyRepository,
}

impl PropertyService {
    pub fn new(db: Database) -> Self {
        Self {
            properties: PropertyRepository::new(db),
        }
    }

    /// Create a property with one generated unit per floor slot. `total_units`
    /// is taken from the plan.
    pub async fn create_with_plan(
        &self,
        owner_id: i64,
        mut property: NewProperty,
        plan: &FloorPlan,
    ) -> Result<(Property, Vec<Unit>), AppError> {
        let Some(total_units) = plan.total_units().filter(|_| plan.within_limits()) else {
            return Err(AppError::validation("num_floors", "Building layout is too large"));
        };
        property.total_units = total_units;
        let (created, units) = self.properties.create_with_units(owner_id, property, plan.units()).await?;
        tracing::info!(
            "Created property {} for owner {} with {} units",
            created.id,
            owner_id,
            units.len()
        );
        Ok((created, units))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn two_floors_three_units_each() {
        let plan = FloorPlan {
            floors: 2,
            units_per_floor: 3,
            ..FloorPlan::default()
        };
        assert_eq!(
            plan.unit_numbers(),
            vec!["F1-U01", "F1-U02", "F1-U03", "F2-U01", "F2-U02", "F2-U03"]
        );
        assert_eq!(plan.total_units(), Some(6));
        assert!(plan.within_limits());
    }

    #[test]
    fn oversized_layout_has_no_total() {
        let plan = FloorPlan {
            floors: 70_000,
            units_per_floor: 70_000,
            ..FloorPlan::default()
        };
        assert_eq!(plan.total_units(), None);
        assert!(!plan.within_limits());

        let wide = FloorPlan {
            floors: 1,
            units_per_floor: FloorPlan::MAX_UNITS_PER_FLOOR + 1,
            ..FloorPlan::default()
        };
        assert_eq!(wide.total_units(), Some(101));
        assert!(!wide.within_limits());
    }

    #[test]
    fn unit_numbers_pad_to_two_digits_only() {
        let plan = FloorPlan {
            floors: 1,
            units_per_floor: 120,
            ..FloorPlan::default()
        };
        let numbers = plan.unit_numbers();
        assert_eq!(numbers[8], "F1-U09");
        assert_eq!(numbers[9], "F1-U10");
        assert_eq!(numbers[119], "F1-U120");
    }

    #[test]
    fn generated_units_carry_defaults() {
        let plan = FloorPlan {
            floors: 1,
            units_per_floor: 2,
            rent_amount: Decimal::from(15_000),
            deposit_amount: Decimal::from(30_000),
            bedrooms: 2,
            bathrooms: Decimal::from_str("1.5").unwrap(),
        };
        let units = plan.units();
        assert_eq!(units.len(), 2);
        for unit in &units {
            assert_eq!(unit.status, UnitStatus::Vacant);
            assert_eq!(unit.rent_amount, Decimal::from(15_000));
            assert_eq!(unit.deposit_amount, Decimal::from(30_000));
            assert_eq!(unit.bedrooms, 2);
            assert_eq!(unit.bathrooms.to_string(), "1.5");
        }
    }
}
