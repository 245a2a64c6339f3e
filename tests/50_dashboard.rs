mod common;

use std::str::FromStr;

use axum::http::StatusCode;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use bomatrack::database::models::{PaymentMethod, PaymentStatus, PaymentType, PropertyType, UnitStatus};
use bomatrack::database::repositories::{NewPayment, NewProperty, NewTenant, NewUnit};
use bomatrack::email::MemoryMailer;
use bomatrack::services::{DashboardOverview, UnitAssignment};
use bomatrack::state::AppState;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn property(name: &str) -> NewProperty {
    NewProperty {
        name: name.into(),
        address: "Ngong Rd".into(),
        city: "Nairobi".into(),
        state: "Nairobi".into(),
        postal_code: "00100".into(),
        country: "Kenya".into(),
        property_type: PropertyType::Apartment,
        total_units: 0,
        description: None,
    }
}

fn unit(number: &str) -> NewUnit {
    NewUnit {
        unit_number: number.into(),
        rent_amount: dec("10000"),
        ..NewUnit::default()
    }
}

fn tenant(first_name: &str, email: &str) -> NewTenant {
    NewTenant {
        first_name: first_name.into(),
        last_name: "Achieng".into(),
        email: email.into(),
        phone: "+254722000000".into(),
        national_id: None,
        emergency_contact_name: None,
        emergency_contact_phone: None,
        employment_info: None,
    }
}

fn lease(unit_id: i64, rent: &str, end_date: NaiveDate) -> UnitAssignment {
    UnitAssignment {
        unit_id,
        start_date: date(2024, 1, 1),
        end_date: Some(end_date),
        rent_amount: dec(rent),
        deposit_paid: Decimal::ZERO,
        lease_terms: None,
    }
}

async fn record(
    state: &AppState,
    tenancy_id: i64,
    amount: &str,
    status: PaymentStatus,
    paid_on: NaiveDate,
    due_date: Option<NaiveDate>,
) -> i64 {
    state
        .payments()
        .create(&NewPayment {
            tenancy_id,
            amount: dec(amount),
            payment_type: PaymentType::Rent,
            payment_method: PaymentMethod::Mpesa,
            payment_reference: None,
            payment_date: paid_on,
            due_date,
            status,
            notes: None,
        })
        .await
        .unwrap()
        .id
}

/// Onboard `first_name` into the unit and return the tenancy id.
async fn move_in(state: &AppState, owner_id: i64, first_name: &str, assignment: UnitAssignment) -> i64 {
    let email = format!("{}@example.com", first_name.to_lowercase());
    state
        .leasing()
        .onboard_tenant(owner_id, tenant(first_name, &email), Some(assignment))
        .await
        .unwrap()
        .tenancy
        .expect("tenancy opened")
        .id
}

#[tokio::test]
async fn dashboard_rolls_up_one_owner_only() {
    let Some(test_db) = common::setup().await else { return };
    let state = test_db.state(MemoryMailer::new());
    let today = date(2024, 3, 15);

    let rosa = common::create_user(&test_db.db, "rosa", "rosa@example.com", true).await;
    let (_, units) = state
        .properties()
        .create_with_units(
            rosa.id,
            property("Riverside"),
            vec![unit("A1"), unit("A2"), unit("A3"), unit("A4")],
        )
        .await
        .unwrap();
    state.units().update_status(units[3].id, UnitStatus::Maintenance).await.unwrap();

    let soon = move_in(&state, rosa.id, "Imani", lease(units[0].id, "10000", date(2024, 3, 25))).await;
    let later = move_in(&state, rosa.id, "Jabari", lease(units[1].id, "12000", date(2024, 5, 30))).await;
    state
        .tenants()
        .create(rosa.id, &tenant("Kesi", "kesi@example.com"))
        .await
        .unwrap();

    let completed = PaymentStatus::Completed;
    record(&state, soon, "10000", completed, date(2024, 3, 1), None).await;
    record(&state, soon, "10000", completed, date(2024, 2, 1), None).await;
    let overdue = record(&state, soon, "5000", PaymentStatus::Pending, date(2024, 3, 5), Some(date(2024, 3, 10))).await;
    let failed = record(&state, soon, "2000", PaymentStatus::Failed, date(2024, 3, 6), Some(date(2024, 4, 1))).await;
    let latest = record(&state, later, "12000", completed, date(2024, 3, 10), None).await;

    // A second owner whose rows must never leak into the first dashboard.
    let simba = common::create_user(&test_db.db, "simba", "simba@example.com", true).await;
    let (_, other_units) = state
        .properties()
        .create_with_units(simba.id, property("Lakeside"), vec![unit("B1")])
        .await
        .unwrap();
    let foreign = move_in(&state, simba.id, "Zawadi", lease(other_units[0].id, "50000", date(2024, 3, 20))).await;
    record(&state, foreign, "99999", PaymentStatus::Pending, date(2024, 3, 12), Some(date(2024, 3, 1))).await;

    let dashboard = state.dashboard();
    let overview = dashboard.overview(rosa.id, today).await.unwrap();
    assert_eq!(overview.properties, 1);
    assert_eq!(overview.units.total, 4);
    assert_eq!(overview.units.occupied, 2);
    assert_eq!(overview.units.vacant, 1);
    assert_eq!(overview.units.maintenance, 1);
    assert_eq!(overview.units.occupancy_rate, 50.0);
    assert_eq!(overview.tenancies.total, 2);
    assert_eq!(overview.tenancies.active, 2);
    assert_eq!(overview.tenancies.rent_due, dec("22000"));
    assert_eq!(overview.tenants, 2);
    assert_eq!(overview.financials.collected_this_month, dec("22000"));
    assert_eq!(overview.financials.overdue_amount, dec("5000"));
    assert_eq!(overview.financials.pending_amount, dec("7000"));
    assert_eq!(overview.financials.pending_count, 2);

    let recent = dashboard.recent_payments(rosa.id, 3).await.unwrap();
    let ids: Vec<i64> = recent.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![latest, failed, overdue]);
    assert_eq!(recent[0].tenant_name, "Jabari Achieng");
    assert_eq!(recent[0].property_name, "Riverside");
    assert_eq!(recent[0].unit_number, "A2");
    assert_eq!(dashboard.recent_payments(rosa.id, 10).await.unwrap().len(), 5);

    let expiring = dashboard.expiring_leases(rosa.id, 30, today).await.unwrap();
    assert_eq!(expiring.len(), 1);
    assert_eq!(expiring[0].id, soon);
    assert_eq!(expiring[0].days_remaining, 10);
    assert_eq!(expiring[0].tenant_name, "Imani Achieng");

    let wider = dashboard.expiring_leases(rosa.id, 90, today).await.unwrap();
    let ids: Vec<i64> = wider.iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![soon, later]);
    assert_eq!(wider[1].days_remaining, 76);

    // Ended leases drop out of the window.
    state.leasing().end_tenancy(soon, rosa.id, date(2024, 3, 14)).await.unwrap();
    let after_end = dashboard.expiring_leases(rosa.id, 30, today).await.unwrap();
    assert!(after_end.is_empty());

    let other = dashboard.overview(simba.id, today).await.unwrap();
    assert_eq!(other.properties, 1);
    assert_eq!(other.units.occupancy_rate, 100.0);
    assert_eq!(other.financials.collected_this_month, Decimal::ZERO);
    assert_eq!(other.financials.overdue_amount, dec("99999"));
    let other_recent = dashboard.recent_payments(simba.id, 10).await.unwrap();
    assert_eq!(other_recent.len(), 1);
    assert_eq!(other_recent[0].tenant_name, "Zawadi Achieng");

    let cookie = common::login(&state, "rosa").await;
    let response = common::send(&state, common::get("/dashboard", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = common::body_text(response).await;
    assert!(html.contains("Jabari Achieng"));
    assert!(!html.contains("Zawadi"));
    assert!(!html.contains("Lakeside"));

    test_db.cleanup().await;
}

#[tokio::test]
async fn owner_without_records_sees_zeroes() {
    let Some(test_db) = common::setup().await else { return };
    let state = test_db.state(MemoryMailer::new());
    let empty = common::create_user(&test_db.db, "tumaini", "tumaini@example.com", true).await;
    let today = date(2024, 3, 15);

    let dashboard = state.dashboard();
    let overview = dashboard.overview(empty.id, today).await.unwrap();
    assert_eq!(overview, DashboardOverview::default());
    assert!(!overview.units.occupancy_rate.is_nan());
    assert!(dashboard.recent_payments(empty.id, 5).await.unwrap().is_empty());
    assert!(dashboard.expiring_leases(empty.id, 30, today).await.unwrap().is_empty());

    let cookie = common::login(&state, "tumaini").await;
    let response = common::send(&state, common::get("/dashboard", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);

    test_db.cleanup().await;
}
