//! Form payloads and their validation. Every field arrives as a string so a
//! rejected form can be re-rendered exactly as the user typed it.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::database::models::{
    PaymentMethod, PaymentStatus, PaymentType, Property, PropertyType, Tenant, Unit, UnitStatus,
};
use crate::database::repositories::{NewPayment, NewProperty, NewTenant, NewUnit};
use crate::error::FieldErrors;
use crate::services::{FloorPlan, UnitAssignment};
use crate::validation::{self, parse_date, parse_decimal, parse_int, Validator};

fn blank_to_none(value: &str) -> Option<String> {
    validation::optional(&Some(value.to_string()))
}

/// Decimal field that may be left blank, falling back to `default`.
fn decimal_or(value: &str, default: Decimal) -> Option<Decimal> {
    if value.trim().is_empty() {
        Some(default)
    } else {
        parse_decimal(value)
    }
}

/// Non-negative in steps of one half, as `NUMERIC(3,1)` bathroom counts are.
fn valid_bathrooms(value: Option<Decimal>) -> bool {
    value.is_some_and(|b| b >= Decimal::ZERO && (b * Decimal::TWO).fract().is_zero())
}

fn optional_date(v: &mut Validator, field: &str, value: &str, message: &str) -> Option<NaiveDate> {
    if value.trim().is_empty() {
        return None;
    }
    let parsed = parse_date(value);
    v.check(field, parsed.is_some(), message);
    parsed
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_serializing)]
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailForm {
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResetPasswordForm {
    pub token: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeleteAccountForm {
    pub delete_password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IdForm {
    pub id: String,
}

impl IdForm {
    pub fn id(&self) -> Option<i64> {
        parse_int::<i64>(&self.id).filter(|id| *id > 0)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EndTenancyForm {
    pub id: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyForm {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub property_type: String,
    pub description: String,
    pub total_units: String,
    pub num_floors: String,
    pub units_per_floor: String,
    pub default_rent: String,
    pub default_deposit: String,
    pub default_bedrooms: String,
    pub default_bathrooms: String,
}

impl PropertyForm {
    fn details(&self, v: &mut Validator, total_units: i32) -> NewProperty {
        v.required("name", &self.name, "Property name is required");
        v.required("address", &self.address, "Address is required");
        v.required("city", &self.city, "City is required");
        v.required("state", &self.state, "State/Region is required");
        v.required("postal_code", &self.postal_code, "Postal code is required");

        let property_type = if self.property_type.trim().is_empty() {
            PropertyType::Apartment
        } else {
            match self.property_type.parse() {
                Ok(kind) => kind,
                Err(_) => {
                    v.add("property_type", "Please select a valid property type");
                    PropertyType::Apartment
                }
            }
        };

        NewProperty {
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            country: blank_to_none(&self.country).unwrap_or_else(|| "Kenya".to_string()),
            property_type,
            total_units,
            description: blank_to_none(&self.description),
        }
    }

    /// New property plus the layout its units are generated from.
    pub fn validate_create(&self) -> Result<(NewProperty, FloorPlan), FieldErrors> {
        let mut v = Validator::new();

        let floors = parse_int::<u32>(&self.num_floors).unwrap_or(0);
        let per_floor = parse_int::<u32>(&self.units_per_floor).unwrap_or(0);
        v.check("num_floors", floors >= 1, "At least 1 floor is required");
        v.check(
            "num_floors",
            floors <= FloorPlan::MAX_FLOORS,
            format!("At most {} floors are allowed", FloorPlan::MAX_FLOORS),
        );
        v.check("units_per_floor", per_floor >= 1, "At least 1 unit per floor is required");
        v.check(
            "units_per_floor",
            per_floor <= FloorPlan::MAX_UNITS_PER_FLOOR,
            format!("At most {} units per floor are allowed", FloorPlan::MAX_UNITS_PER_FLOOR),
        );

        let rent = decimal_or(&self.default_rent, Decimal::ZERO);
        let deposit = decimal_or(&self.default_deposit, Decimal::ZERO);
        let bathrooms = decimal_or(&self.default_bathrooms, Decimal::ONE);
        let bedrooms = if self.default_bedrooms.trim().is_empty() {
            Some(1)
        } else {
            parse_int::<i32>(&self.default_bedrooms)
        };
        v.check("default_rent", rent.is_some_and(|r| r >= Decimal::ZERO), "Default rent must be a valid amount");
        v.check(
            "default_deposit",
            deposit.is_some_and(|d| d >= Decimal::ZERO),
            "Default deposit must be a valid amount",
        );
        v.check("default_bedrooms", bedrooms.is_some_and(|b| b >= 0), "Bedrooms must be 0 or more");
        v.check(
            "default_bathrooms",
            valid_bathrooms(bathrooms),
            "Bathrooms must be 0 or more in half steps",
        );

        let plan = FloorPlan {
            floors,
            units_per_floor: per_floor,
            rent_amount: rent.unwrap_or_default(),
            deposit_amount: deposit.unwrap_or_default(),
            bedrooms: bedrooms.unwrap_or(1),
            bathrooms: bathrooms.unwrap_or(Decimal::ONE),
        };
        let total_units = plan.total_units().filter(|_| plan.within_limits()).unwrap_or(0);
        let property = self.details(&mut v, total_units);
        v.finish()?;
        Ok((property, plan))
    }

    pub fn validate_update(&self) -> Result<NewProperty, FieldErrors> {
        let mut v = Validator::new();
        let total_units = parse_int::<i32>(&self.total_units).filter(|n| *n >= 0).unwrap_or(1);
        let property = self.details(&mut v, total_units);
        v.finish()?;
        Ok(property)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitForm {
    pub property_id: String,
    pub unit_number: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub square_feet: String,
    pub rent_amount: String,
    pub deposit_amount: String,
    pub status: String,
    pub description: String,
}

impl UnitForm {
    /// Target property id (unchecked for ownership) and the unit fields.
    pub fn validate(&self) -> Result<(i64, NewUnit), FieldErrors> {
        let mut v = Validator::new();

        let property_id = parse_int::<i64>(&self.property_id).filter(|id| *id > 0);
        v.check("property_id", property_id.is_some(), "Property is required");
        v.required("unit_number", &self.unit_number, "Unit number is required");

        let rent = parse_decimal(&self.rent_amount);
        v.check(
            "rent_amount",
            rent.is_some_and(|r| r >= Decimal::ZERO),
            "Valid rent amount is required",
        );
        let deposit = decimal_or(&self.deposit_amount, Decimal::ZERO);
        v.check(
            "deposit_amount",
            deposit.is_some_and(|d| d >= Decimal::ZERO),
            "Deposit must be a valid amount",
        );

        let bedrooms = if self.bedrooms.trim().is_empty() {
            Some(1)
        } else {
            parse_int::<i32>(&self.bedrooms)
        };
        v.check("bedrooms", bedrooms.is_some_and(|b| b >= 0), "Bedrooms must be 0 or more");
        let bathrooms = decimal_or(&self.bathrooms, Decimal::ONE);
        v.check("bathrooms", valid_bathrooms(bathrooms), "Bathrooms must be 0 or more in half steps");

        let square_feet = if self.square_feet.trim().is_empty() {
            None
        } else {
            let parsed = parse_int::<i32>(&self.square_feet).filter(|s| *s >= 0);
            v.check("square_feet", parsed.is_some(), "Square feet must be a whole number");
            parsed
        };

        let status = if self.status.trim().is_empty() {
            UnitStatus::Vacant
        } else {
            match self.status.parse() {
                Ok(status) => status,
                Err(_) => {
                    v.add("status", "Please select a valid status");
                    UnitStatus::Vacant
                }
            }
        };

        v.finish()?;
        Ok((
            property_id.unwrap_or_default(),
            NewUnit {
                unit_number: self.unit_number.trim().to_string(),
                bedrooms: bedrooms.unwrap_or(1),
                bathrooms: bathrooms.unwrap_or(Decimal::ONE),
                square_feet,
                rent_amount: rent.unwrap_or_default(),
                deposit_amount: deposit.unwrap_or_default(),
                status,
                description: blank_to_none(&self.description),
            },
        ))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub national_id: String,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    pub employment_info: String,
    pub unit_id: String,
    pub start_date: String,
    pub end_date: String,
    pub rent_amount: String,
    pub deposit_paid: String,
    pub lease_terms: String,
}

impl TenantForm {
    fn details(&self, v: &mut Validator) -> NewTenant {
        v.required("first_name", &self.first_name, "First name is required");
        v.required("last_name", &self.last_name, "Last name is required");
        let email = self.email.trim();
        if email.is_empty() {
            v.add("email", "Email is required");
        } else if !validation::is_valid_email(email) {
            v.add("email", "Valid email is required");
        }
        v.required("phone", &self.phone, "Phone number is required");

        NewTenant {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: email.to_lowercase(),
            phone: self.phone.trim().to_string(),
            national_id: blank_to_none(&self.national_id),
            emergency_contact_name: blank_to_none(&self.emergency_contact_name),
            emergency_contact_phone: blank_to_none(&self.emergency_contact_phone),
            employment_info: blank_to_none(&self.employment_info),
        }
    }

    /// Tenant details plus an optional unit assignment.
    pub fn validate_create(&self) -> Result<(NewTenant, Option<UnitAssignment>), FieldErrors> {
        let mut v = Validator::new();
        let tenant = self.details(&mut v);

        let assignment = match blank_to_none(&self.unit_id) {
            None => None,
            Some(raw) => {
                let unit_id = parse_int::<i64>(&raw).filter(|id| *id > 0);
                v.check("unit_id", unit_id.is_some(), "Please select a valid unit");

                let start_date = parse_date(&self.start_date);
                v.check(
                    "start_date",
                    start_date.is_some(),
                    "Start date is required when assigning a unit",
                );
                let rent = parse_decimal(&self.rent_amount).filter(|r| *r > Decimal::ZERO);
                v.check("rent_amount", rent.is_some(), "Valid rent amount is required");
                let end_date = optional_date(&mut v, "end_date", &self.end_date, "End date must be a valid date");
                if let (Some(start), Some(end)) = (start_date, end_date) {
                    v.check("end_date", end >= start, "End date cannot be before the start date");
                }
                let deposit = decimal_or(&self.deposit_paid, Decimal::ZERO);
                v.check(
                    "deposit_paid",
                    deposit.is_some_and(|d| d >= Decimal::ZERO),
                    "Deposit must be a valid amount",
                );

                match (unit_id, start_date, rent) {
                    (Some(unit_id), Some(start_date), Some(rent_amount)) => Some(UnitAssignment {
                        unit_id,
                        start_date,
                        end_date,
                        rent_amount,
                        deposit_paid: deposit.unwrap_or_default(),
                        lease_terms: blank_to_none(&self.lease_terms),
                    }),
                    _ => None,
                }
            }
        };

        v.finish()?;
        Ok((tenant, assignment))
    }

    pub fn validate_update(&self) -> Result<NewTenant, FieldErrors> {
        let mut v = Validator::new();
        let tenant = self.details(&mut v);
        v.finish()?;
        Ok(tenant)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentForm {
    pub tenancy_id: String,
    pub amount: String,
    pub payment_type: String,
    pub payment_method: String,
    pub payment_reference: String,
    pub payment_date: String,
    pub due_date: String,
    pub status: String,
    pub notes: String,
}

impl PaymentForm {
    pub fn validate(&self) -> Result<NewPayment, FieldErrors> {
        let mut v = Validator::new();

        let tenancy_id = parse_int::<i64>(&self.tenancy_id).filter(|id| *id > 0);
        v.check("tenancy_id", tenancy_id.is_some(), "Please select a tenant");
        let amount = parse_decimal(&self.amount).filter(|a| *a > Decimal::ZERO);
        v.check("amount", amount.is_some(), "Valid amount is required");
        let payment_date = parse_date(&self.payment_date);
        v.check("payment_date", payment_date.is_some(), "Payment date is required");
        let due_date = optional_date(&mut v, "due_date", &self.due_date, "Due date must be a valid date");

        let payment_type = parse_choice(&mut v, "payment_type", &self.payment_type, PaymentType::Rent);
        let payment_method = parse_choice(&mut v, "payment_method", &self.payment_method, PaymentMethod::Cash);
        let status = parse_choice(&mut v, "status", &self.status, PaymentStatus::Completed);

        v.finish()?;
        let (Some(tenancy_id), Some(amount), Some(payment_date)) = (tenancy_id, amount, payment_date) else {
            return Err(FieldErrors::new());
        };
        Ok(NewPayment {
            tenancy_id,
            amount,
            payment_type,
            payment_method,
            payment_reference: blank_to_none(&self.payment_reference),
            payment_date,
            due_date,
            status,
            notes: blank_to_none(&self.notes),
        })
    }
}

impl From<&Property> for PropertyForm {
    fn from(property: &Property) -> Self {
        Self {
            name: property.name.clone(),
            address: property.address.clone(),
            city: property.city.clone(),
            state: property.state.clone(),
            postal_code: property.postal_code.clone(),
            country: property.country.clone(),
            property_type: property.property_type.to_string(),
            description: property.description.clone().unwrap_or_default(),
            total_units: property.total_units.to_string(),
            ..Self::default()
        }
    }
}

impl From<&Unit> for UnitForm {
    fn from(unit: &Unit) -> Self {
        Self {
            property_id: unit.property_id.to_string(),
            unit_number: unit.unit_number.clone(),
            bedrooms: unit.bedrooms.to_string(),
            bathrooms: unit.bathrooms.normalize().to_string(),
            square_feet: unit.square_feet.map(|s| s.to_string()).unwrap_or_default(),
            rent_amount: unit.rent_amount.to_string(),
            deposit_amount: unit.deposit_amount.to_string(),
            status: unit.status.to_string(),
            description: unit.description.clone().unwrap_or_default(),
        }
    }
}

impl From<&Tenant> for TenantForm {
    fn from(tenant: &Tenant) -> Self {
        Self {
            first_name: tenant.first_name.clone(),
            last_name: tenant.last_name.clone(),
            email: tenant.email.clone(),
            phone: tenant.phone.clone(),
            national_id: tenant.national_id.clone().unwrap_or_default(),
            emergency_contact_name: tenant.emergency_contact_name.clone().unwrap_or_default(),
            emergency_contact_phone: tenant.emergency_contact_phone.clone().unwrap_or_default(),
            employment_info: tenant.employment_info.clone().unwrap_or_default(),
            ..Self::default()
        }
    }
}

fn parse_choice<T: std::str::FromStr>(v: &mut Validator, field: &str, value: &str, default: T) -> T {
    if value.trim().is_empty() {
        return default;
    }
    match value.parse() {
        Ok(choice) => choice,
        Err(_) => {
            v.add(field, "Please select a valid option");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn property_form() -> PropertyForm {
        PropertyForm {
            name: "Kilimani Heights".into(),
            address: "Argwings Kodhek Rd".into(),
            city: "Nairobi".into(),
            state: "Nairobi County".into(),
            postal_code: "00100".into(),
            num_floors: "2".into(),
            units_per_floor: "3".into(),
            default_rent: "25,000".into(),
            ..PropertyForm::default()
        }
    }

    #[test]
    fn property_create_applies_defaults() {
        let (property, plan) = property_form().validate_create().unwrap();
        assert_eq!(property.country, "Kenya");
        assert_eq!(property.property_type, PropertyType::Apartment);
        assert_eq!(property.total_units, 6);
        assert_eq!(plan.rent_amount, Decimal::from(25_000));
        assert_eq!(plan.bedrooms, 1);
        assert_eq!(plan.bathrooms, Decimal::ONE);
    }

    #[test]
    fn property_create_requires_layout_and_address() {
        let form = PropertyForm {
            num_floors: "0".into(),
            units_per_floor: "".into(),
            city: "".into(),
            ..property_form()
        };
        let errors = form.validate_create().unwrap_err();
        assert_eq!(errors["num_floors"], "At least 1 floor is required");
        assert_eq!(errors["units_per_floor"], "At least 1 unit per floor is required");
        assert_eq!(errors["city"], "City is required");
        assert!(!errors.contains_key("name"));
    }

    #[test]
    fn property_create_caps_the_layout() {
        let form = PropertyForm {
            num_floors: "70000".into(),
            units_per_floor: "70000".into(),
            ..property_form()
        };
        let errors = form.validate_create().unwrap_err();
        assert_eq!(errors["num_floors"], "At most 200 floors are allowed");
        assert_eq!(errors["units_per_floor"], "At most 100 units per floor are allowed");

        let largest = PropertyForm {
            num_floors: "200".into(),
            units_per_floor: "100".into(),
            ..property_form()
        };
        let (property, plan) = largest.validate_create().unwrap();
        assert_eq!(property.total_units, 20_000);
        assert_eq!(plan.total_units(), Some(20_000));
    }

    #[test]
    fn property_create_rejects_quarter_bathrooms() {
        let form = PropertyForm {
            default_bathrooms: "1.25".into(),
            ..property_form()
        };
        let errors = form.validate_create().unwrap_err();
        assert_eq!(errors["default_bathrooms"], "Bathrooms must be 0 or more in half steps");

        let half = PropertyForm {
            default_bathrooms: "2.5".into(),
            ..property_form()
        };
        let (_, plan) = half.validate_create().unwrap();
        assert_eq!(plan.bathrooms, Decimal::new(25, 1));
    }

    #[test]
    fn unit_form_rejects_quarter_bathrooms() {
        let form = UnitForm {
            property_id: "3".into(),
            unit_number: "A1".into(),
            rent_amount: "12000".into(),
            bathrooms: "1.25".into(),
            ..UnitForm::default()
        };
        assert!(form.validate().unwrap_err().contains_key("bathrooms"));

        let ok = UnitForm {
            bathrooms: "1.5".into(),
            ..form
        };
        let (property_id, unit) = ok.validate().unwrap();
        assert_eq!(property_id, 3);
        assert_eq!(unit.status, UnitStatus::Vacant);
    }

    #[test]
    fn tenant_assignment_needs_start_date_and_rent() {
        let form = TenantForm {
            first_name: "Wanjiru".into(),
            last_name: "Kamau".into(),
            email: "Wanjiru@Example.com".into(),
            phone: "+254700000001".into(),
            unit_id: "9".into(),
            rent_amount: "0".into(),
            ..TenantForm::default()
        };
        let errors = form.validate_create().unwrap_err();
        assert_eq!(errors["start_date"], "Start date is required when assigning a unit");
        assert_eq!(errors["rent_amount"], "Valid rent amount is required");
    }

    #[test]
    fn tenant_without_unit_has_no_assignment() {
        let form = TenantForm {
            first_name: "Wanjiru".into(),
            last_name: "Kamau".into(),
            email: "Wanjiru@Example.com".into(),
            phone: "+254700000001".into(),
            ..TenantForm::default()
        };
        let (tenant, assignment) = form.validate_create().unwrap();
        assert_eq!(tenant.email, "wanjiru@example.com");
        assert!(assignment.is_none());
    }

    #[test]
    fn payment_defaults_and_errors() {
        let form = PaymentForm {
            tenancy_id: "4".into(),
            amount: "15000".into(),
            payment_date: "2024-03-01".into(),
            ..PaymentForm::default()
        };
        let payment = form.validate().unwrap();
        assert_eq!(payment.payment_type, PaymentType::Rent);
        assert_eq!(payment.payment_method, PaymentMethod::Cash);
        assert_eq!(payment.status, PaymentStatus::Completed);

        let bad = PaymentForm {
            tenancy_id: "".into(),
            amount: "-5".into(),
            payment_date: "yesterday".into(),
            ..PaymentForm::default()
        };
        let errors = bad.validate().unwrap_err();
        assert_eq!(errors["tenancy_id"], "Please select a tenant");
        assert_eq!(errors["amount"], "Valid amount is required");
        assert_eq!(errors["payment_date"], "Payment date is required");
    }
}
