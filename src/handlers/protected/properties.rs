// handlers/protected/properties.rs - Property listing and CRUD
//
// GET  /properties
// GET  /properties/create   POST /properties/create
// GET  /properties/edit?id= POST /properties/edit?id=
// POST /properties/delete

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::auth::SessionContext;
use crate::database::models::{PropertyType, PropertyWithStats};
use crate::error::{AppError, FieldErrors};
use crate::handlers::forms::{IdForm, PropertyForm};
use crate::handlers::{render, PageQuery};
use crate::middleware::RequireVerified;
use crate::state::AppState;
use crate::views::base_context;

/// Totals across every listed property.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PropertyTotals {
    pub units: i64,
    pub occupied: i64,
    pub vacant: i64,
    pub maintenance: i64,
    pub rent_roll: Decimal,
}

impl PropertyTotals {
    pub fn from_properties(properties: &[PropertyWithStats]) -> Self {
        properties.iter().fold(Self::default(), |mut totals, p| {
            totals.units += p.units_count;
            totals.occupied += p.occupied_units;
            totals.vacant += p.vacant_units;
            totals.maintenance += p.maintenance_units;
            totals.rent_roll += p.total_rent_roll;
            totals
        })
    }
}

fn property_form_page(
    state: &AppState,
    session: &SessionContext,
    property_id: Option<i64>,
    form: &PropertyForm,
    errors: &FieldErrors,
    error: Option<String>,
) -> Result<Response, AppError> {
    let title = if property_id.is_some() { "Edit Property" } else { "Add Property" };
    let status = if errors.is_empty() { StatusCode::OK } else { StatusCode::BAD_REQUEST };

    let mut context = base_context(title, Some(session));
    context.insert("property_id", &property_id);
    context.insert("form", form);
    context.insert("errors", errors);
    context.insert("error", &error);
    context.insert("property_types", &PropertyType::ALL.iter().map(|t| t.as_str()).collect::<Vec<_>>());
    render(state, "properties/form.html", &context, status)
}

pub async fn properties_get(
    State(state): State<AppState>,
    RequireVerified(session): RequireVerified,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    let repo = state.properties();
    let (properties, summary) =
        futures::try_join!(repo.get_all_by_owner(session.user_id), repo.get_summary(session.user_id))?;

    let mut flash = query.flash("Property");
    if query.created.is_some() {
        flash.success = Some("Property created successfully with auto-generated units!".to_string());
    }

    let mut context = base_context("Properties", Some(&session));
    context.insert("totals", &PropertyTotals::from_properties(&properties));
    context.insert("properties", &properties);
    context.insert("summary", &summary);
    flash.apply(&mut context);
    render(&state, "properties/index.html", &context, StatusCode::OK)
}

pub async fn property_create_get(
    State(state): State<AppState>,
    RequireVerified(session): RequireVerified,
) -> Result<Response, AppError> {
    let form = PropertyForm {
        country: "Kenya".into(),
        property_type: PropertyType::Apartment.to_string(),
        num_floors: "1".into(),
        units_per_floor: "1".into(),
        default_bedrooms: "1".into(),
        default_bathrooms: "1".into(),
        ..PropertyForm::default()
    };
    property_form_page(&state, &session, None, &form, &FieldErrors::new(), None)
}

pub async fn property_create_post(
    State(state): State<AppState>,
    RequireVerified(session): RequireVerified,
    Form(form): Form<PropertyForm>,
) -> Result<Response, AppError> {
    let (property, plan) = match form.validate_create() {
        Ok(valid) => valid,
        Err(errors) => return property_form_page(&state, &session, None, &form, &errors, None),
    };

    match state.property_service().create_with_plan(session.user_id, property, &plan).await {
        Ok(_) => Ok(Redirect::to("/properties?created=1").into_response()),
        Err(e) => {
            tracing::error!("Property creation failed for owner {}: {}", session.user_id, e);
            let error = Some("Failed to create property. Please try again.".to_string());
            property_form_page(&state, &session, None, &form, &FieldErrors::new(), error)
        }
    }
}

pub async fn property_edit_get(
    State(state): State<AppState>,
    RequireVerified(session): RequireVerified,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    let Some(id) = query.id() else {
        return Ok(Redirect::to("/properties").into_response());
    };
    let Some(property) = state.properties().find_by_id(id, session.user_id).await? else {
        return Ok(Redirect::to("/properties").into_response());
    };

    let error = query
        .error
        .is_some()
        .then(|| "Failed to update property. Please try again.".to_string());
    property_form_page(
        &state,
        &session,
        Some(id),
        &PropertyForm::from(&property),
        &FieldErrors::new(),
        error,
    )
}

pub async fn property_edit_post(
    State(state): State<AppState>,
    RequireVerified(session): RequireVerified,
    Query(query): Query<PageQuery>,
    Form(form): Form<PropertyForm>,
) -> Result<Response, AppError> {
    let Some(id) = query.id() else {
        return Ok(Redirect::to("/properties").into_response());
    };
    let changes = match form.validate_update() {
        Ok(changes) => changes,
        Err(errors) => return property_form_page(&state, &session, Some(id), &form, &errors, None),
    };

    match state.properties().update(id, session.user_id, &changes).await {
        Ok(true) => Ok(Redirect::to("/properties?updated=1").into_response()),
        Ok(false) => Ok(Redirect::to("/properties").into_response()),
        Err(e) => {
            tracing::error!("Property {} update failed: {}", id, e);
            Ok(Redirect::to(&format!("/properties/edit?id={}&error=1", id)).into_response())
        }
    }
}

pub async fn property_delete_post(
    State(state): State<AppState>,
    RequireVerified(session): RequireVerified,
    Form(form): Form<IdForm>,
) -> Result<Response, AppError> {
    let Some(id) = form.id() else {
        return Ok(Redirect::to("/properties?error=not_found").into_response());
    };

    let location = match state.properties().delete(id, session.user_id).await {
        Ok(true) => "/properties?deleted=1",
        Ok(false) => "/properties?error=not_found",
        Err(e) => {
            tracing::error!("Property {} delete failed: {}", id, e);
            "/properties?error=delete_failed"
        }
    };
    Ok(Redirect::to(location).into_response())
}
