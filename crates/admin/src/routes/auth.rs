//! Admin sign-in.
//!
//! Admins sign in with their Firebase Authentication account. Only addresses
//! listed in `ADMIN_EMAILS` get a session; everyone else is turned away after
//! the password check so the allowlist is not probeable.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument, warn};
use vapeshop_core::Email;
use vapeshop_firebase::IdentityError;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAdminAuth, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Query parameters for error display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<&'static str>,
}

/// Text for a login error code.
#[must_use]
pub fn error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "Incorrect email or password.",
        "forbidden" => "This account does not have back-office access.",
        "rate_limited" => "Too many attempts. Please wait a moment and try again.",
        "disabled" => "This account has been disabled.",
        _ => "Sign-in failed. Please try again.",
    }
}

fn login_error(code: &str) -> Response {
    Redirect::to(&format!("/auth/login?error={code}")).into_response()
}

/// Display the login page, or go to the dashboard when already signed in.
pub async fn login_page(
    OptionalAdminAuth(admin): OptionalAdminAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    if admin.is_some() {
        return Redirect::to("/").into_response();
    }
    LoginTemplate {
        error: query.error.as_deref().map(error_message),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip_all, fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let Ok(email) = Email::parse(&form.email) else {
        return Ok(login_error("credentials"));
    };

    let auth = match state.identity().sign_in(&email, &form.password).await {
        Ok(auth) => auth,
        Err(IdentityError::InvalidCredentials) => return Ok(login_error("credentials")),
        Err(IdentityError::TooManyAttempts) => return Ok(login_error("rate_limited")),
        Err(IdentityError::UserDisabled) => return Ok(login_error("disabled")),
        Err(e) => return Err(e.into()),
    };

    if !state.config().is_admin(&email) {
        warn!("sign-in by account outside the admin allowlist");
        return Ok(login_error("forbidden"));
    }

    let admin = CurrentAdmin {
        id: auth.local_id,
        email,
    };
    set_current_admin(&session, &admin).await?;
    set_sentry_user(&admin.id, Some(admin.email.as_str()));
    info!(admin_id = %admin.id, "admin signed in");

    Ok(Redirect::to("/").into_response())
}

/// Handle logout.
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_admin(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/auth/login"))
}
