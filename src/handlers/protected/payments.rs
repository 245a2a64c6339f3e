// handlers/protected/payments.rs - Payment ledger
//
// GET  /payments
// GET  /payments/create  POST /payments/create
// POST /payments/delete

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Serialize;

use crate::auth::SessionContext;
use crate::database::models::{PaymentMethod, PaymentStatus, PaymentType, TenancyDetails};
use crate::error::{AppError, FieldErrors};
use crate::handlers::forms::{IdForm, PaymentForm};
use crate::handlers::{render, today, PageQuery};
use crate::middleware::RequireVerified;
use crate::state::AppState;
use crate::views::base_context;

/// Active lease offered in the payment form's tenant select.
#[derive(Debug, Serialize)]
struct LeaseChoice {
    #[serde(flatten)]
    details: TenancyDetails,
    tenant_name: String,
}

fn names<T: ToString>(values: &[T]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

async fn payment_form_page(
    state: &AppState,
    session: &SessionContext,
    form: &PaymentForm,
    errors: &FieldErrors,
    error: Option<String>,
) -> Result<Response, AppError> {
    let leases: Vec<LeaseChoice> = state
        .tenancies()
        .get_active_by_owner(session.user_id)
        .await?
        .into_iter()
        .map(|details| LeaseChoice {
            tenant_name: details.tenant_name(),
            details,
        })
        .collect();

    let mut context = base_context("Record Payment", Some(session));
    context.insert("form", form);
    context.insert("errors", errors);
    context.insert("error", &error);
    context.insert("tenancies", &leases);
    context.insert("payment_types", &names(PaymentType::ALL));
    context.insert("payment_methods", &names(PaymentMethod::ALL));
    context.insert("statuses", &names(PaymentStatus::ALL));

    let status = if errors.is_empty() { StatusCode::OK } else { StatusCode::BAD_REQUEST };
    render(state, "payments/form.html", &context, status)
}

pub async fn payments_get(
    State(state): State<AppState>,
    RequireVerified(session): RequireVerified,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    let repo = state.payments();
    let (payments, summary) =
        futures::try_join!(repo.get_all_by_owner(session.user_id), repo.get_summary(session.user_id))?;

    let mut flash = query.flash("Payment");
    if query.created.is_some() {
        flash.success = Some("Payment recorded successfully".to_string());
    }

    let mut context = base_context("Payments", Some(&session));
    context.insert("payments", &payments);
    context.insert("summary", &summary);
    flash.apply(&mut context);
    render(&state, "payments/index.html", &context, StatusCode::OK)
}

pub async fn payment_create_get(
    State(state): State<AppState>,
    RequireVerified(session): RequireVerified,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    let form = PaymentForm {
        payment_date: today().to_string(),
        payment_type: PaymentType::Rent.to_string(),
        payment_method: PaymentMethod::Cash.to_string(),
        status: PaymentStatus::Completed.to_string(),
        ..PaymentForm::default()
    };
    let error = query
        .error
        .is_some()
        .then(|| "Failed to record payment. Please try again.".to_string());
    payment_form_page(&state, &session, &form, &FieldErrors::new(), error).await
}

pub async fn payment_create_post(
    State(state): State<AppState>,
    RequireVerified(session): RequireVerified,
    Form(form): Form<PaymentForm>,
) -> Result<Response, AppError> {
    let payment = match form.validate() {
        Ok(payment) => payment,
        Err(errors) => return payment_form_page(&state, &session, &form, &errors, None).await,
    };

    let lease = state.tenancies().find_for_owner(payment.tenancy_id, session.user_id).await?;
    if !lease.is_some_and(|l| l.tenancy.is_active()) {
        let errors = FieldErrors::from([("tenancy_id".to_string(), "Please select a tenant".to_string())]);
        return payment_form_page(&state, &session, &form, &errors, None).await;
    }

    match state.payments().create(&payment).await {
        Ok(created) => {
            tracing::info!("Recorded payment {} on tenancy {}", created.id, created.tenancy_id);
            Ok(Redirect::to("/payments?created=1").into_response())
        }
        Err(e) => {
            tracing::error!("Payment creation failed: {}", e);
            Ok(Redirect::to("/payments/create?error=1").into_response())
        }
    }
}

pub async fn payment_delete_post(
    State(state): State<AppState>,
    RequireVerified(session): RequireVerified,
    Form(form): Form<IdForm>,
) -> Result<Response, AppError> {
    let Some(id) = form.id() else {
        return Ok(Redirect::to("/payments?error=not_found").into_response());
    };

    let location = match state.payments().delete(id, session.user_id).await {
        Ok(true) => "/payments?deleted=1",
        Ok(false) => "/payments?error=not_found",
        Err(e) => {
            tracing::error!("Payment {} delete failed: {}", id, e);
            "/payments?error=delete_failed"
        }
    };
    Ok(Redirect::to(location).into_response())
}
