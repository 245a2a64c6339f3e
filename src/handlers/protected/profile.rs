// handlers/protected/profile.rs - GET/POST /profile, POST /profile/password, POST /profile/delete

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};

use crate::auth::SessionContext;
use crate::database::models::User;
use crate::database::repositories::ProfileUpdate;
use crate::error::{AppError, FieldErrors};
use crate::handlers::forms::{DeleteAccountForm, PasswordForm, ProfileForm};
use crate::handlers::{redirect_with_cookie, render};
use crate::middleware::RequireAuth;
use crate::services::AuthError;
use crate::state::AppState;
use crate::views::base_context;

/// What the profile page shows besides the user row.
#[derive(Default)]
struct ProfilePage {
    form: Option<ProfileForm>,
    errors: FieldErrors,
    success: Option<&'static str>,
}

fn profile_form(user: &User) -> ProfileForm {
    ProfileForm {
        username: user.username.clone(),
        first_name: user.first_name.clone().unwrap_or_default(),
        last_name: user.last_name.clone().unwrap_or_default(),
        phone: user.phone.clone().unwrap_or_default(),
    }
}

async fn render_profile(
    state: &AppState,
    session: &SessionContext,
    page: ProfilePage,
) -> Result<Response, AppError> {
    let Some(user) = state.users().find_by_id(session.user_id).await? else {
        return Ok(Redirect::to("/login").into_response());
    };
    let status = if page.errors.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };

    let mut context = base_context("Profile", Some(session));
    context.insert("form", &page.form.unwrap_or_else(|| profile_form(&user)));
    context.insert("user", &user);
    context.insert("errors", &page.errors);
    context.insert("success", &page.success);
    render(state, "profile.html", &context, status)
}

pub async fn profile_get(
    State(state): State<AppState>,
    RequireAuth(session): RequireAuth,
) -> Result<Response, AppError> {
    render_profile(&state, &session, ProfilePage::default()).await
}

pub async fn profile_post(
    State(state): State<AppState>,
    RequireAuth(session): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    let update = ProfileUpdate {
        username: form.username.clone(),
        first_name: Some(form.first_name.clone()),
        last_name: Some(form.last_name.clone()),
        phone: Some(form.phone.clone()),
    };

    let page = match state.auth().update_profile(session.user_id, update).await {
        Ok(_) => ProfilePage {
            success: Some("Profile updated successfully"),
            ..ProfilePage::default()
        },
        Err(AuthError::Validation(errors)) => ProfilePage {
            form: Some(form),
            errors,
            success: None,
        },
        Err(e) => return Err(e.into()),
    };
    render_profile(&state, &session, page).await
}

pub async fn password_post(
    State(state): State<AppState>,
    RequireAuth(session): RequireAuth,
    Form(form): Form<PasswordForm>,
) -> Result<Response, AppError> {
    let result = state
        .auth()
        .change_password(
            session.user_id,
            &form.current_password,
            &form.new_password,
            &form.confirm_password,
        )
        .await;

    let page = match result {
        Ok(_) => ProfilePage {
            success: Some("Password changed successfully"),
            ..ProfilePage::default()
        },
        Err(AuthError::Validation(errors)) => ProfilePage {
            errors,
            ..ProfilePage::default()
        },
        Err(e) => return Err(e.into()),
    };
    render_profile(&state, &session, page).await
}

/// Password-confirmed account removal; the browser session goes with it.
pub async fn delete_account_post(
    State(state): State<AppState>,
    RequireAuth(session): RequireAuth,
    Form(form): Form<DeleteAccountForm>,
) -> Result<Response, AppError> {
    match state.auth().delete_account(session.user_id, &form.delete_password).await {
        Ok(_) => {
            let cookie = state.sessions.removal_cookie().to_string();
            Ok(redirect_with_cookie("/login?deleted=1", cookie))
        }
        Err(AuthError::Validation(errors)) => {
            let page = ProfilePage {
                errors,
                ..ProfilePage::default()
            };
            render_profile(&state, &session, page).await
        }
        Err(e) => Err(e.into()),
    }
}
