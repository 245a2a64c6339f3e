mod common;

use std::str::FromStr;

use axum::http::StatusCode;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use bomatrack::database::models::{StatusChangeError, TenancyStatus, UnitStatus};
use bomatrack::database::repositories::{NewTenant, NewUnit};
use bomatrack::email::MemoryMailer;
use bomatrack::services::{LeasingError, UnitAssignment};

fn tenant(email: &str) -> NewTenant {
    NewTenant {
        first_name: "Wanjiru".into(),
        last_name: "Kamau".into(),
        email: email.into(),
        phone: "+254700000001".into(),
        national_id: None,
        emergency_contact_name: None,
        emergency_contact_phone: None,
        employment_info: None,
    }
}

fn lease(unit_id: i64, rent: &str) -> UnitAssignment {
    UnitAssignment {
        unit_id,
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end_date: None,
        rent_amount: Decimal::from_str(rent).unwrap(),
        deposit_paid: Decimal::ZERO,
        lease_terms: None,
    }
}

const PROPERTY_FORM: &str = "name=Riverside+Court&address=12+River+Rd&city=Nairobi&state=Nairobi\
&postal_code=00100&country=Kenya&property_type=apartment&num_floors=2&units_per_floor=3\
&default_rent=15000&default_deposit=15000&default_bedrooms=2&default_bathrooms=1";

#[tokio::test]
async fn property_form_generates_units_and_leasing_tracks_occupancy() {
    let Some(test_db) = common::setup().await else { return };
    let state = test_db.state(MemoryMailer::new());
    let owner = common::create_user(&test_db.db, "erin", "erin@example.com", true).await;
    let cookie = common::login(&state, "erin").await;

    let response = common::send(&state, common::post_form("/properties/create", PROPERTY_FORM, Some(&cookie))).await;
    assert_eq!(common::location(&response), "/properties?created=1");

    let properties = state.properties().get_all_by_owner(owner.id).await.unwrap();
    assert_eq!(properties.len(), 1);
    let property = &properties[0];
    assert_eq!(property.property.total_units, 6);

    let units = state.units().get_all_by_property(property.property.id).await.unwrap();
    let mut numbers: Vec<_> = units.iter().map(|u| u.unit_number.as_str()).collect();
    numbers.sort();
    assert_eq!(numbers, ["F1-U01", "F1-U02", "F1-U03", "F2-U01", "F2-U02", "F2-U03"]);
    assert!(units.iter().all(|u| u.status == UnitStatus::Vacant));
    assert!(units.iter().all(|u| u.rent_amount == Decimal::from(15000)));

    let unit_id = units[0].id;
    let onboarded = state
        .leasing()
        .onboard_tenant(owner.id, tenant("wanjiru@example.com"), Some(lease(unit_id, "15000")))
        .await
        .unwrap();
    let tenancy = onboarded.tenancy.expect("tenancy opened");
    assert_eq!(tenancy.status, TenancyStatus::Active);
    let unit = state.units().find_by_id(unit_id).await.unwrap().unwrap();
    assert_eq!(unit.status, UnitStatus::Occupied);

    // The unit is taken now.
    let second = state
        .leasing()
        .onboard_tenant(owner.id, tenant("otieno@example.com"), Some(lease(unit_id, "15000")))
        .await;
    assert!(matches!(second, Err(LeasingError::UnitUnavailable(id)) if id == unit_id));

    let duplicate = state
        .leasing()
        .onboard_tenant(owner.id, tenant("wanjiru@example.com"), None)
        .await;
    assert!(matches!(duplicate, Err(LeasingError::DuplicateEmail(_))));

    let response = common::send(
        &state,
        common::post_form(
            "/tenancies/end",
            &format!("id={}&end_date=2024-06-30", tenancy.id),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(
        common::location(&response),
        format!("/tenants/edit?id={}&updated=1", onboarded.tenant.id)
    );
    let unit = state.units().find_by_id(unit_id).await.unwrap().unwrap();
    assert_eq!(unit.status, UnitStatus::Vacant);
    let ended = state.tenancies().find_by_id(tenancy.id).await.unwrap().unwrap();
    assert_eq!(ended.status, TenancyStatus::Ended);
    assert_eq!(ended.end_date, NaiveDate::from_ymd_opt(2024, 6, 30));

    test_db.cleanup().await;
}

#[tokio::test]
async fn deleting_a_tenant_leaves_the_unit_occupied() {
    let Some(test_db) = common::setup().await else { return };
    let state = test_db.state(MemoryMailer::new());
    let owner = common::create_user(&test_db.db, "femi", "femi@example.com", true).await;
    let cookie = common::login(&state, "femi").await;

    common::send(&state, common::post_form("/properties/create", PROPERTY_FORM, Some(&cookie))).await;
    let property = state.properties().get_all_by_owner(owner.id).await.unwrap().remove(0);
    let unit_id = state.units().get_all_by_property(property.property.id).await.unwrap()[0].id;
    let onboarded = state
        .leasing()
        .onboard_tenant(owner.id, tenant("akinyi@example.com"), Some(lease(unit_id, "12000")))
        .await
        .unwrap();

    let response = common::send(
        &state,
        common::post_form("/tenants/delete", &format!("id={}", onboarded.tenant.id), Some(&cookie)),
    )
    .await;
    assert_eq!(common::location(&response), "/tenants?deleted=1");

    let unit = state.units().find_by_id(unit_id).await.unwrap().unwrap();
    assert_eq!(unit.status, UnitStatus::Occupied);
    assert!(state.tenancies().get_active_by_unit(unit_id).await.unwrap().is_none());

    test_db.cleanup().await;
}

#[tokio::test]
async fn owners_cannot_reach_each_others_records() {
    let Some(test_db) = common::setup().await else { return };
    let state = test_db.state(MemoryMailer::new());
    let grace = common::create_user(&test_db.db, "grace", "grace@example.com", true).await;
    common::create_user(&test_db.db, "hassan", "hassan@example.com", true).await;
    let grace_cookie = common::login(&state, "grace").await;
    let hassan_cookie = common::login(&state, "hassan").await;

    common::send(&state, common::post_form("/properties/create", PROPERTY_FORM, Some(&grace_cookie))).await;
    let property = state.properties().get_all_by_owner(grace.id).await.unwrap().remove(0);
    let id = property.property.id;

    let response = common::send(
        &state,
        common::get(&format!("/properties/edit?id={id}"), Some(&hassan_cookie)),
    )
    .await;
    assert_eq!(common::location(&response), "/properties");

    let response = common::send(
        &state,
        common::post_form("/properties/delete", &format!("id={id}"), Some(&hassan_cookie)),
    )
    .await;
    assert_eq!(common::location(&response), "/properties?error=not_found");
    assert!(state.properties().find_by_id(id, grace.id).await.unwrap().is_some());

    let response = common::send(&state, common::get("/properties", Some(&hassan_cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!common::body_text(response).await.contains("Riverside Court"));

    let response = common::send(&state, common::get("/properties", Some(&grace_cookie))).await;
    assert!(common::body_text(response).await.contains("Riverside Court"));

    test_db.cleanup().await;
}

#[tokio::test]
async fn invalid_property_form_is_rerendered_with_errors() {
    let Some(test_db) = common::setup().await else { return };
    let state = test_db.state(MemoryMailer::new());
    common::create_user(&test_db.db, "ivy", "ivy@example.com", true).await;
    let cookie = common::login(&state, "ivy").await;

    let response = common::send(
        &state,
        common::post_form("/properties/create", "name=&num_floors=0&units_per_floor=2", Some(&cookie)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let html = common::body_text(response).await;
    assert!(html.contains("Property name is required"));
    assert!(html.contains("At least 1 floor is required"));

    test_db.cleanup().await;
}

#[tokio::test]
async fn unit_edit_cannot_release_a_unit_leased_since_it_was_read() {
    let Some(test_db) = common::setup().await else { return };
    let state = test_db.state(MemoryMailer::new());
    let owner = common::create_user(&test_db.db, "jomo", "jomo@example.com", true).await;
    let cookie = common::login(&state, "jomo").await;

    common::send(&state, common::post_form("/properties/create", PROPERTY_FORM, Some(&cookie))).await;
    let property = state.properties().get_all_by_owner(owner.id).await.unwrap().remove(0);
    let units = state.units().get_all_by_property(property.property.id).await.unwrap();
    let (leased, spare) = (units[0].id, units[1].id);

    // The edit form was read while the unit was still vacant.
    let read = state.units().find_for_owner(leased, owner.id).await.unwrap().unwrap();
    assert_eq!(read.unit.status, UnitStatus::Vacant);
    state
        .leasing()
        .onboard_tenant(owner.id, tenant("baraka@example.com"), Some(lease(leased, "15000")))
        .await
        .unwrap();

    let edit = NewUnit {
        unit_number: read.unit.unit_number.clone(),
        rent_amount: read.unit.rent_amount,
        status: UnitStatus::Vacant,
        ..NewUnit::default()
    };
    let refused = state.leasing().edit_unit(owner.id, leased, edit).await;
    assert!(matches!(
        refused,
        Err(LeasingError::StatusChange(StatusChangeError::OccupiedLocked))
    ));
    let unit = state.units().find_by_id(leased).await.unwrap().unwrap();
    assert_eq!(unit.status, UnitStatus::Occupied);
    assert!(state.tenancies().get_active_by_unit(leased).await.unwrap().is_some());

    let response = common::send(
        &state,
        common::post_form(
            &format!("/units/edit?id={leased}"),
            "unit_number=F1-U01&rent_amount=15000&status=vacant",
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(common::body_text(response)
        .await
        .contains("An occupied unit is released by ending its tenancy"));

    let response = common::send(
        &state,
        common::post_form(
            &format!("/units/edit?id={spare}"),
            "unit_number=F1-U02&rent_amount=16000&status=maintenance",
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let unit = state.units().find_by_id(spare).await.unwrap().unwrap();
    assert_eq!(unit.status, UnitStatus::Maintenance);
    assert_eq!(unit.rent_amount, Decimal::from(16000));

    test_db.cleanup().await;
}

#[tokio::test]
async fn payments_need_an_active_lease_of_the_owner() {
    let Some(test_db) = common::setup().await else { return };
    let state = test_db.state(MemoryMailer::new());
    let kioko = common::create_user(&test_db.db, "kioko", "kioko@example.com", true).await;
    let lulu = common::create_user(&test_db.db, "lulu", "lulu@example.com", true).await;
    let kioko_cookie = common::login(&state, "kioko").await;
    let lulu_cookie = common::login(&state, "lulu").await;

    let mut leases = Vec::new();
    for (owner, cookie, email) in [
        (&kioko, &kioko_cookie, "neema@example.com"),
        (&lulu, &lulu_cookie, "otieno@example.com"),
    ] {
        common::send(&state, common::post_form("/properties/create", PROPERTY_FORM, Some(cookie))).await;
        let property = state.properties().get_all_by_owner(owner.id).await.unwrap().remove(0);
        let unit_id = state.units().get_all_by_property(property.property.id).await.unwrap()[0].id;
        let onboarded = state
            .leasing()
            .onboard_tenant(owner.id, tenant(email), Some(lease(unit_id, "15000")))
            .await
            .unwrap();
        leases.push(onboarded.tenancy.expect("tenancy opened").id);
    }
    let (kioko_lease, lulu_lease) = (leases[0], leases[1]);

    let pay = |tenancy_id: i64| format!("tenancy_id={tenancy_id}&amount=15000&payment_date=2024-02-01");

    let response = common::send(
        &state,
        common::post_form("/payments/create", &pay(lulu_lease), Some(&kioko_cookie)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(common::body_text(response).await.contains("Please select a tenant"));
    assert!(state.payments().get_all_by_owner(lulu.id).await.unwrap().is_empty());

    let response = common::send(
        &state,
        common::post_form("/payments/create", &pay(kioko_lease), Some(&kioko_cookie)),
    )
    .await;
    assert_eq!(common::location(&response), "/payments?created=1");
    let recorded = state.payments().get_all_by_owner(kioko.id).await.unwrap();
    assert_eq!(recorded.len(), 1);
    let payment_id = recorded[0].payment.id;

    let ended = state
        .leasing()
        .end_tenancy(kioko_lease, kioko.id, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap())
        .await
        .unwrap();
    assert!(ended);
    let response = common::send(
        &state,
        common::post_form("/payments/create", &pay(kioko_lease), Some(&kioko_cookie)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(common::body_text(response).await.contains("Please select a tenant"));

    let response = common::send(
        &state,
        common::post_form("/payments/delete", &format!("id={payment_id}"), Some(&lulu_cookie)),
    )
    .await;
    assert_eq!(common::location(&response), "/payments?error=not_found");
    assert!(state.payments().find_by_id(payment_id).await.unwrap().is_some());

    let response = common::send(
        &state,
        common::post_form("/payments/delete", &format!("id={payment_id}"), Some(&kioko_cookie)),
    )
    .await;
    assert_eq!(common::location(&response), "/payments?deleted=1");
    assert!(state.payments().find_by_id(payment_id).await.unwrap().is_none());

    test_db.cleanup().await;
}

#[tokio::test]
async fn oversized_building_layout_is_rejected() {
    let Some(test_db) = common::setup().await else { return };
    let state = test_db.state(MemoryMailer::new());
    let owner = common::create_user(&test_db.db, "mumbi", "mumbi@example.com", true).await;
    let cookie = common::login(&state, "mumbi").await;

    let form = PROPERTY_FORM
        .replace("num_floors=2", "num_floors=70000")
        .replace("units_per_floor=3", "units_per_floor=70000");
    let response = common::send(&state, common::post_form("/properties/create", &form, Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let html = common::body_text(response).await;
    assert!(html.contains("At most 200 floors are allowed"));
    assert!(state.properties().get_all_by_owner(owner.id).await.unwrap().is_empty());

    test_db.cleanup().await;
}
