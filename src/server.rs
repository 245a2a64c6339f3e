// HTTP surface: routes, middleware stack and the listener loop.

use axum::{
    extract::Request,
    http::{Method, StatusCode, Uri},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post, MethodRouter},
    Router, ServiceExt,
};
use std::time::Duration;
use tokio::net::TcpListener;
use tower::Layer;
use tower_http::{
    normalize_path::{NormalizePath, NormalizePathLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::error::not_found_body;
use crate::handlers::{protected, public};
use crate::middleware::session_middleware;
use crate::state::AppState;

/// Unknown paths and known paths hit with the wrong method get the same
/// plain-text 404.
async fn route_not_found(method: Method, uri: Uri) -> Response {
    (StatusCode::NOT_FOUND, not_found_body(method.as_str(), uri.path())).into_response()
}

fn page(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.fallback(route_not_found)
}

fn auth_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/login", page(get(auth::login_get).post(auth::login_post)))
        .route("/register", page(get(auth::register_get).post(auth::register_post)))
        .route("/logout", page(get(auth::logout).post(auth::logout)))
        .route("/verify-email", page(get(auth::verify_email_get)))
        .route(
            "/resend-verification",
            page(get(auth::resend_verification_get).post(auth::resend_verification_post)),
        )
        .route(
            "/forgot-password",
            page(get(auth::forgot_password_get).post(auth::forgot_password_post)),
        )
        .route(
            "/reset-password",
            page(get(auth::reset_password_get).post(auth::reset_password_post)),
        )
}

fn owner_routes() -> Router<AppState> {
    use protected as p;

    Router::new()
        .route("/", page(get(p::dashboard_get)))
        .route("/dashboard", page(get(p::dashboard_get)))
        .route("/profile", page(get(p::profile_get).post(p::profile_post)))
        .route("/profile/password", page(post(p::password_post)))
        .route("/profile/delete", page(post(p::delete_account_post)))
        .route("/properties", page(get(p::properties_get)))
        .route(
            "/properties/create",
            page(get(p::property_create_get).post(p::property_create_post)),
        )
        .route("/properties/edit", page(get(p::property_edit_get).post(p::property_edit_post)))
        .route("/properties/delete", page(post(p::property_delete_post)))
        .route("/units", page(get(p::units_get)))
        .route("/units/create", page(get(p::unit_create_get).post(p::unit_create_post)))
        .route("/units/edit", page(get(p::unit_edit_get).post(p::unit_edit_post)))
        .route("/units/delete", page(post(p::unit_delete_post)))
        .route("/tenants", page(get(p::tenants_get)))
        .route("/tenants/create", page(get(p::tenant_create_get).post(p::tenant_create_post)))
        .route("/tenants/edit", page(get(p::tenant_edit_get).post(p::tenant_edit_post)))
        .route("/tenants/delete", page(post(p::tenant_delete_post)))
        .route("/tenancies/end", page(post(p::tenancy_end_post)))
        .route("/payments", page(get(p::payments_get)))
        .route(
            "/payments/create",
            page(get(p::payment_create_get).post(p::payment_create_post)),
        )
        .route("/payments/delete", page(post(p::payment_delete_post)))
}

/// Routed application without path normalization.
pub fn router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.server.request_timeout_secs.max(1));

    Router::new()
        .route("/health", page(get(public::health_get)))
        .merge(auth_routes())
        .merge(owner_routes())
        .fallback(route_not_found)
        .layer(from_fn_with_state(state.clone(), session_middleware))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Full application. Trailing slashes are stripped before routing, so
/// `/properties/` reaches `/properties` while `/` stays the root.
pub fn app(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    let app = app(state);
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn not_found_body_is_plain_text() {
        let response = route_not_found(Method::DELETE, Uri::from_static("/properties")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(
            std::str::from_utf8(&body).unwrap(),
            "404 - Not Found\nRoute not found for DELETE /properties"
        );
    }
}
