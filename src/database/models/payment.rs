use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::pg_enum_strings;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    #[default]
    Rent,
    Deposit,
    LateFee,
    Maintenance,
    Other,
}

pg_enum_strings!(PaymentType, "payment type", {
    Rent => "rent",
    Deposit => "deposit",
    LateFee => "late_fee",
    Maintenance => "maintenance",
    Other => "other",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Mpesa,
    BankTransfer,
    Cheque,
    Other,
}

pg_enum_strings!(PaymentMethod, "payment method", {
    Cash => "cash",
    Mpesa => "mpesa",
    BankTransfer => "bank_transfer",
    Cheque => "cheque",
    Other => "other",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Completed,
    Pending,
    Failed,
}

pg_enum_strings!(PaymentStatus, "payment status", {
    Completed => "completed",
    Pending => "pending",
    Failed => "failed",
});

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: i64,
    pub tenancy_id: i64,
    pub amount: Decimal,
    pub payment_type: PaymentType,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub payment_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub status: PaymentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payment joined with the names needed to list it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub payment: Payment,
    pub first_name: String,
    pub last_name: String,
    pub unit_number: String,
    pub property_name: String,
    pub monthly_rent: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct PaymentSummary {
    pub total_payments: i64,
    pub total_collected: Decimal,
    pub pending_amount: Decimal,
    pub rent_collected: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenancyBalance {
    pub months_elapsed: i64,
    pub monthly_rent: Decimal,
    pub total_due: Decimal,
    pub total_paid: Decimal,
    pub balance: Decimal,
}

impl TenancyBalance {
    /// Rent owed from `start` through `today`, counting the current month as
    /// due. A lease that has not started yet owes nothing.
    pub fn compute(start: NaiveDate, today: NaiveDate, monthly_rent: Decimal, total_paid: Decimal) -> Self {
        let months_elapsed = months_elapsed(start, today);
        let total_due = monthly_rent * Decimal::from(months_elapsed);
        Self {
            months_elapsed,
            monthly_rent,
            total_due,
            total_paid,
            balance: total_due - total_paid,
        }
    }
}

/// Whole months between the two dates, plus one for the month in progress.
pub fn months_elapsed(start: NaiveDate, today: NaiveDate) -> i64 {
    if today < start {
        return 0;
    }
    let mut months = i64::from(today.year() - start.year()) * 12
        + i64::from(today.month()) - i64::from(start.month());
    if today.day() < start.day() {
        months -= 1;
    }
    months + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn first_month_is_due_on_start_date() {
        assert_eq!(months_elapsed(date(2024, 1, 15), date(2024, 1, 15)), 1);
        assert_eq!(months_elapsed(date(2024, 1, 15), date(2024, 2, 14)), 1);
        assert_eq!(months_elapsed(date(2024, 1, 15), date(2024, 2, 15)), 2);
    }

    #[test]
    fn spans_years() {
        assert_eq!(months_elapsed(date(2023, 11, 1), date(2024, 2, 1)), 4);
    }

    #[test]
    fn future_lease_owes_nothing() {
        assert_eq!(months_elapsed(date(2024, 6, 1), date(2024, 5, 31)), 0);
        let balance = TenancyBalance::compute(date(2024, 6, 1), date(2024, 5, 1), Decimal::new(1000000, 2), Decimal::ZERO);
        assert_eq!(balance.total_due, Decimal::ZERO);
    }

    #[test]
    fn balance_subtracts_completed_rent() {
        let rent = Decimal::new(2500000, 2);
        let paid = Decimal::new(5000000, 2);
        let balance = TenancyBalance::compute(date(2024, 1, 1), date(2024, 3, 10), rent, paid);
        assert_eq!(balance.months_elapsed, 3);
        assert_eq!(balance.total_due, Decimal::new(7500000, 2));
        assert_eq!(balance.balance, Decimal::new(2500000, 2));
    }

    #[test]
    fn payment_enums_round_trip_form_values() {
        use std::str::FromStr;
        assert_eq!(PaymentMethod::from_str("bank_transfer").unwrap(), PaymentMethod::BankTransfer);
        assert_eq!(PaymentType::LateFee.as_str(), "late_fee");
        assert_eq!(PaymentStatus::default(), PaymentStatus::Completed);
    }
}
