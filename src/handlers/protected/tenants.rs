// handlers/protected/tenants.rs - Tenant listing, CRUD and ending leases
//
// GET  /tenants
// GET  /tenants/create   POST /tenants/create
// GET  /tenants/edit?id= POST /tenants/edit?id=
// POST /tenants/delete
// POST /tenancies/end

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Serialize;

use crate::auth::SessionContext;
use crate::database::models::{TenancyBalance, TenancyDetails};
use crate::error::{AppError, FieldErrors};
use crate::handlers::forms::{EndTenancyForm, IdForm, TenantForm};
use crate::handlers::{render, today, Flash, PageQuery};
use crate::middleware::RequireVerified;
use crate::services::leasing_service::{MSG_DUPLICATE_TENANT, MSG_UNIT_UNAVAILABLE};
use crate::services::LeasingError;
use crate::state::AppState;
use crate::validation::{parse_date, parse_int};
use crate::views::base_context;

/// One row of a tenant's lease history.
#[derive(Debug, Serialize)]
struct LeaseRow {
    #[serde(flatten)]
    details: TenancyDetails,
    tenant_name: String,
    /// Only computed for active leases.
    balance: Option<TenancyBalance>,
}

fn leasing_errors(err: LeasingError) -> FieldErrors {
    let (field, message) = match err {
        LeasingError::DuplicateEmail(_) => ("email", MSG_DUPLICATE_TENANT),
        LeasingError::UnitNotFound(_) | LeasingError::UnitUnavailable(_) => ("unit_id", MSG_UNIT_UNAVAILABLE),
        LeasingError::Database(e) => {
            tracing::error!("Tenant onboarding failed: {}", e);
            ("general", "Failed to create tenant. Please try again.")
        }
    };
    FieldErrors::from([(field.to_string(), message.to_string())])
}

async fn lease_history(state: &AppState, tenant_id: i64, owner_id: i64) -> Result<Vec<LeaseRow>, AppError> {
    let tenancies = state.tenancies().get_by_tenant(tenant_id, owner_id).await?;
    let payments = state.payments();
    let today = today();

    let mut rows = Vec::with_capacity(tenancies.len());
    for details in tenancies {
        let balance = if details.tenancy.is_active() {
            payments.get_tenancy_balance(details.tenancy.id, owner_id, today).await?
        } else {
            None
        };
        rows.push(LeaseRow {
            tenant_name: details.tenant_name(),
            details,
            balance,
        });
    }
    Ok(rows)
}

async fn tenant_form_page(
    state: &AppState,
    session: &SessionContext,
    tenant_id: Option<i64>,
    form: &TenantForm,
    errors: &FieldErrors,
    flash: Option<Flash>,
) -> Result<Response, AppError> {
    let owner = session.user_id;
    let mut context = base_context(
        if tenant_id.is_some() { "Edit Tenant" } else { "Add Tenant" },
        Some(session),
    );

    match tenant_id {
        Some(id) => context.insert("tenancies", &lease_history(state, id, owner).await?),
        None => context.insert("units", &state.units().get_vacant_units_by_owner(owner).await?),
    }
    context.insert("tenant_id", &tenant_id);
    context.insert("form", form);
    context.insert("errors", errors);
    context.insert("today", &today());
    flash.unwrap_or_default().apply(&mut context);

    let status = if errors.is_empty() { StatusCode::OK } else { StatusCode::BAD_REQUEST };
    render(state, "tenants/form.html", &context, status)
}

pub async fn tenants_get(
    State(state): State<AppState>,
    RequireVerified(session): RequireVerified,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    let repo = state.tenants();
    let (tenants, summary) =
        futures::try_join!(repo.get_all_by_owner(session.user_id), repo.get_summary(session.user_id))?;

    let mut context = base_context("Tenants", Some(&session));
    context.insert("tenants", &tenants);
    context.insert("summary", &summary);
    query.flash("Tenant").apply(&mut context);
    render(&state, "tenants/index.html", &context, StatusCode::OK)
}

pub async fn tenant_create_get(
    State(state): State<AppState>,
    RequireVerified(session): RequireVerified,
) -> Result<Response, AppError> {
    let form = TenantForm {
        start_date: today().to_string(),
        ..TenantForm::default()
    };
    tenant_form_page(&state, &session, None, &form, &FieldErrors::new(), None).await
}

pub async fn tenant_create_post(
    State(state): State<AppState>,
    RequireVerified(session): RequireVerified,
    Form(form): Form<TenantForm>,
) -> Result<Response, AppError> {
    let (tenant, assignment) = match form.validate_create() {
        Ok(valid) => valid,
        Err(errors) => return tenant_form_page(&state, &session, None, &form, &errors, None).await,
    };

    match state.leasing().onboard_tenant(session.user_id, tenant, assignment).await {
        Ok(_) => Ok(Redirect::to("/tenants?created=1").into_response()),
        Err(e) => tenant_form_page(&state, &session, None, &form, &leasing_errors(e), None).await,
    }
}

pub async fn tenant_edit_get(
    State(state): State<AppState>,
    RequireVerified(session): RequireVerified,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    let Some(id) = query.id() else {
        return Ok(Redirect::to("/tenants").into_response());
    };
    let Some(tenant) = state.tenants().find_by_id(id, session.user_id).await? else {
        return Ok(Redirect::to("/tenants").into_response());
    };

    let flash = Flash {
        success: query.updated.as_ref().map(|_| "Tenancy ended successfully".to_string()),
        error: query.error.as_ref().map(|_| "Failed to end tenancy. Please try again.".to_string()),
    };
    let form = TenantForm::from(&tenant);
    tenant_form_page(&state, &session, Some(id), &form, &FieldErrors::new(), Some(flash)).await
}

pub async fn tenant_edit_post(
    State(state): State<AppState>,
    RequireVerified(session): RequireVerified,
    Query(query): Query<PageQuery>,
    Form(form): Form<TenantForm>,
) -> Result<Response, AppError> {
    let Some(id) = query.id() else {
        return Ok(Redirect::to("/tenants").into_response());
    };
    let owner = session.user_id;
    let repo = state.tenants();

    let mut errors = match form.validate_update() {
        Ok(changes) => {
            if repo.find_by_email(owner, &changes.email, Some(id)).await?.is_some() {
                FieldErrors::from([("email".to_string(), MSG_DUPLICATE_TENANT.to_string())])
            } else {
                match repo.update(id, owner, &changes).await {
                    Ok(true) => return Ok(Redirect::to("/tenants?updated=1").into_response()),
                    Ok(false) => return Ok(Redirect::to("/tenants").into_response()),
                    Err(e) => {
                        tracing::error!("Tenant {} update failed: {}", id, e);
                        FieldErrors::new()
                    }
                }
            }
        }
        Err(errors) => errors,
    };
    if errors.is_empty() {
        errors.insert("general".into(), "Failed to update tenant. Please try again.".into());
    }

    tenant_form_page(&state, &session, Some(id), &form, &errors, None).await
}

pub async fn tenant_delete_post(
    State(state): State<AppState>,
    RequireVerified(session): RequireVerified,
    Form(form): Form<IdForm>,
) -> Result<Response, AppError> {
    let Some(id) = form.id() else {
        return Ok(Redirect::to("/tenants?error=not_found").into_response());
    };

    let location = match state.tenants().delete(id, session.user_id).await {
        Ok(true) => "/tenants?deleted=1",
        Ok(false) => "/tenants?error=not_found",
        Err(e) => {
            tracing::error!("Tenant {} delete failed: {}", id, e);
            "/tenants?error=delete_failed"
        }
    };
    Ok(Redirect::to(location).into_response())
}

/// End an active lease. A blank end date means today.
pub async fn tenancy_end_post(
    State(state): State<AppState>,
    RequireVerified(session): RequireVerified,
    Form(form): Form<EndTenancyForm>,
) -> Result<Response, AppError> {
    let owner = session.user_id;
    let Some(id) = parse_int::<i64>(&form.id).filter(|id| *id > 0) else {
        return Ok(Redirect::to("/tenants?error=not_found").into_response());
    };
    let Some(lease) = state.tenancies().find_for_owner(id, owner).await? else {
        return Ok(Redirect::to("/tenants?error=not_found").into_response());
    };
    let back = format!("/tenants/edit?id={}", lease.tenancy.tenant_id);

    let end_date = if form.end_date.trim().is_empty() {
        Some(today())
    } else {
        parse_date(&form.end_date)
    };
    let Some(end_date) = end_date.filter(|d| *d >= lease.tenancy.start_date) else {
        return Ok(Redirect::to(&format!("{}&error=1", back)).into_response());
    };

    let location = match state.leasing().end_tenancy(id, owner, end_date).await {
        Ok(true) => format!("{}&updated=1", back),
        Ok(false) => format!("{}&error=1", back),
        Err(e) => {
            tracing::error!("Ending tenancy {} failed: {}", id, e);
            format!("{}&error=1", back)
        }
    };
    Ok(Redirect::to(&location).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leasing_conflicts_map_to_fields() {
        let errors = leasing_errors(LeasingError::DuplicateEmail("jane@example.com".into()));
        assert_eq!(errors.get("email").map(String::as_str), Some(MSG_DUPLICATE_TENANT));

        let errors = leasing_errors(LeasingError::UnitUnavailable(3));
        assert_eq!(errors.get("unit_id").map(String::as_str), Some(MSG_UNIT_UNAVAILABLE));
    }
}
