// handlers/protected/units.rs - Unit listing and CRUD
//
// GET  /units[?property_id=]
// GET  /units/create[?property_id=]  POST /units/create
// GET  /units/edit?id=               POST /units/edit?id=
// POST /units/delete

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};

use crate::auth::SessionContext;
use crate::database::models::{UnitStatus, UnitSummary};
use crate::error::{AppError, FieldErrors};
use crate::handlers::forms::{IdForm, UnitForm};
use crate::handlers::{render, PageQuery};
use crate::middleware::RequireVerified;
use crate::services::LeasingError;
use crate::state::AppState;
use crate::views::base_context;

const MSG_DUPLICATE_UNIT: &str = "Unit number already exists for this property";

struct UnitFormPage<'a> {
    unit_id: Option<i64>,
    form: &'a UnitForm,
    errors: &'a FieldErrors,
    /// Statuses the user may pick, given the unit's current status.
    statuses: Vec<UnitStatus>,
}

async fn unit_form_page(
    state: &AppState,
    session: &SessionContext,
    page: UnitFormPage<'_>,
) -> Result<Response, AppError> {
    let properties = state.properties().get_all_by_owner(session.user_id).await?;
    let title = if page.unit_id.is_some() { "Edit Unit" } else { "Add Unit" };
    let status = if page.errors.is_empty() { StatusCode::OK } else { StatusCode::BAD_REQUEST };

    let mut context = base_context(title, Some(session));
    context.insert("unit_id", &page.unit_id);
    context.insert("form", page.form);
    context.insert("errors", page.errors);
    context.insert("properties", &properties);
    context.insert("statuses", &page.statuses.iter().map(|s| s.as_str()).collect::<Vec<_>>());
    render(state, "units/form.html", &context, status)
}

fn units_location(property_id: i64, flag: &str) -> String {
    format!("/units?property_id={}&{}", property_id, flag)
}

pub async fn units_get(
    State(state): State<AppState>,
    RequireVerified(session): RequireVerified,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    let property = match query.property_id() {
        Some(id) => match state.properties().find_by_id(id, session.user_id).await? {
            Some(property) => Some(property),
            None => return Ok(Redirect::to("/units").into_response()),
        },
        None => None,
    };

    let units = state
        .units()
        .get_all_by_owner(session.user_id, property.as_ref().map(|p| p.id))
        .await?;
    let summary = UnitSummary::from_units(units.iter().map(|u| &u.unit));

    let mut context = base_context("Units", Some(&session));
    context.insert("units", &units);
    context.insert("summary", &summary);
    context.insert("property", &property);
    query.flash("Unit").apply(&mut context);
    render(&state, "units/index.html", &context, StatusCode::OK)
}

pub async fn unit_create_get(
    State(state): State<AppState>,
    RequireVerified(session): RequireVerified,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    let form = UnitForm {
        property_id: query.property_id().map(|id| id.to_string()).unwrap_or_default(),
        bedrooms: "1".into(),
        bathrooms: "1".into(),
        status: UnitStatus::Vacant.to_string(),
        ..UnitForm::default()
    };
    let page = UnitFormPage {
        unit_id: None,
        form: &form,
        errors: &FieldErrors::new(),
        statuses: UnitStatus::Vacant.manual_choices(),
    };
    unit_form_page(&state, &session, page).await
}

pub async fn unit_create_post(
    State(state): State<AppState>,
    RequireVerified(session): RequireVerified,
    Form(form): Form<UnitForm>,
) -> Result<Response, AppError> {
    let mut errors = FieldErrors::new();
    let statuses = UnitStatus::Vacant.manual_choices();

    match form.validate() {
        Ok((property_id, new)) => {
            if state.properties().find_by_id(property_id, session.user_id).await?.is_none() {
                errors.insert("property_id".into(), "Invalid property selected".into());
            }
            if let Err(e) = UnitStatus::Vacant.manual_transition(new.status) {
                errors.insert("status".into(), e.to_string());
            }

            if errors.is_empty() {
                match state.units().create(property_id, &new).await {
                    Ok(unit) => {
                        tracing::info!("Created unit {} in property {}", unit.id, property_id);
                        return Ok(Redirect::to(&units_location(property_id, "created=1")).into_response());
                    }
                    Err(e) if e.is_unique_violation() => {
                        errors.insert("unit_number".into(), MSG_DUPLICATE_UNIT.into());
                    }
                    Err(e) => {
                        tracing::error!("Unit creation failed: {}", e);
                        errors.insert("general".into(), "Failed to create unit. Please try again.".into());
                    }
                }
            }
        }
        Err(invalid) => errors = invalid,
    }

    let page = UnitFormPage {
        unit_id: None,
        form: &form,
        errors: &errors,
        statuses,
    };
    unit_form_page(&state, &session, page).await
}

pub async fn unit_edit_get(
    State(state): State<AppState>,
    RequireVerified(session): RequireVerified,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    let Some(id) = query.id() else {
        return Ok(Redirect::to("/units").into_response());
    };
    let Some(found) = state.units().find_for_owner(id, session.user_id).await? else {
        return Ok(Redirect::to("/units").into_response());
    };

    let form = UnitForm::from(&found.unit);
    let page = UnitFormPage {
        unit_id: Some(id),
        form: &form,
        errors: &FieldErrors::new(),
        statuses: found.unit.status.manual_choices(),
    };
    unit_form_page(&state, &session, page).await
}

pub async fn unit_edit_post(
    State(state): State<AppState>,
    RequireVerified(session): RequireVerified,
    Query(query): Query<PageQuery>,
    Form(mut form): Form<UnitForm>,
) -> Result<Response, AppError> {
    let Some(id) = query.id() else {
        return Ok(Redirect::to("/units").into_response());
    };
    let Some(current) = state.units().find_for_owner(id, session.user_id).await? else {
        return Ok(Redirect::to("/units").into_response());
    };
    // A unit stays in the property it was created in.
    form.property_id = current.unit.property_id.to_string();
    let current_status = current.unit.status;

    let errors = match form.validate() {
        Ok((property_id, changes)) => {
            let mut errors = FieldErrors::new();
            match state.leasing().edit_unit(session.user_id, id, changes).await {
                Ok(_) => {
                    return Ok(Redirect::to(&units_location(property_id, "updated=1")).into_response());
                }
                Err(LeasingError::UnitNotFound(_)) => return Ok(Redirect::to("/units").into_response()),
                Err(LeasingError::StatusChange(e)) => {
                    errors.insert("status".into(), e.to_string());
                }
                Err(LeasingError::Database(e)) if e.is_unique_violation() => {
                    errors.insert("unit_number".into(), MSG_DUPLICATE_UNIT.into());
                }
                Err(e) => {
                    tracing::error!("Unit {} update failed: {}", id, e);
                    errors.insert("general".into(), "Failed to update unit. Please try again.".into());
                }
            }
            errors
        }
        Err(invalid) => invalid,
    };

    let page = UnitFormPage {
        unit_id: Some(id),
        form: &form,
        errors: &errors,
        statuses: current_status.manual_choices(),
    };
    unit_form_page(&state, &session, page).await
}

pub async fn unit_delete_post(
    State(state): State<AppState>,
    RequireVerified(session): RequireVerified,
    Form(form): Form<IdForm>,
) -> Result<Response, AppError> {
    let Some(id) = form.id() else {
        return Ok(Redirect::to("/units?error=not_found").into_response());
    };
    let Some(found) = state.units().find_for_owner(id, session.user_id).await? else {
        return Ok(Redirect::to("/units?error=not_found").into_response());
    };
    let property_id = found.unit.property_id;

    let location = match state.units().delete(id, session.user_id).await {
        Ok(true) => units_location(property_id, "deleted=1"),
        Ok(false) => "/units?error=not_found".to_string(),
        Err(e) => {
            tracing::error!("Unit {} delete failed: {}", id, e);
            units_location(property_id, "error=delete_failed")
        }
    };
    Ok(Redirect::to(&location).into_response())
}
