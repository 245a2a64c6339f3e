// handlers/protected/dashboard.rs - GET / and GET /dashboard

use axum::{extract::State, http::StatusCode, response::Response};

use crate::error::AppError;
use crate::handlers::{render, today};
use crate::middleware::RequireVerified;
use crate::state::AppState;
use crate::views::base_context;

pub async fn dashboard_get(
    State(state): State<AppState>,
    RequireVerified(session): RequireVerified,
) -> Result<Response, AppError> {
    let dashboard = state.dashboard();
    let today = today();
    let owner = session.user_id;

    let (overview, recent_payments, expiring_leases) = futures::try_join!(
        dashboard.overview(owner, today),
        dashboard.recent_payments(owner, state.config.app.recent_payments_limit),
        dashboard.expiring_leases(owner, state.config.app.expiring_lease_days, today),
    )?;

    let mut context = base_context("Dashboard", Some(&session));
    context.insert("overview", &overview);
    context.insert("recent_payments", &recent_payments);
    context.insert("expiring_leases", &expiring_leases);
    context.insert("expiring_lease_days", &state.config.app.expiring_lease_days);
    context.insert("today", &today);
    render(&state, "dashboard.html", &context, StatusCode::OK)
}
