use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::pg_enum_strings;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "property_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    #[default]
    Apartment,
    House,
    Commercial,
    Other,
}

pg_enum_strings!(PropertyType, "property type", {
    Apartment => "apartment",
    House => "house",
    Commercial => "commercial",
    Other => "other",
});

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Property {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub property_type: PropertyType,
    /// Declared capacity; independent of how many unit rows exist.
    pub total_units: i32,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Property row plus aggregates over its units.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PropertyWithStats {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub property: Property,
    pub units_count: i64,
    pub occupied_units: i64,
    pub vacant_units: i64,
    pub maintenance_units: i64,
    pub total_rent_roll: Decimal,
    pub avg_rent: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct PropertySummary {
    pub total_properties: i64,
    pub declared_units: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_known_types() {
        assert_eq!(PropertyType::from_str("house").unwrap(), PropertyType::House);
        assert_eq!(PropertyType::from_str(" commercial ").unwrap(), PropertyType::Commercial);
        assert!(PropertyType::from_str("castle").is_err());
    }

    #[test]
    fn defaults_to_apartment() {
        assert_eq!(PropertyType::default(), PropertyType::Apartment);
        assert_eq!(PropertyType::ALL.len(), 4);
    }
}
