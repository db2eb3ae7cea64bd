//! Authentication route handlers.
//!
//! Sign-up and sign-in go through Firebase Authentication. A successful
//! registration also writes the customer profile to `users/<id>`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument, warn};
use vapeshop_core::{Email, Phone, UserProfile};
use vapeshop_firebase::{IdentityError, paths};

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Minimum password length accepted by Firebase Authentication.
pub const MIN_PASSWORD_LENGTH: usize = 6;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub next: String,
}

/// Registration form data.
#[derive(Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub password_confirm: String,
}

/// Query parameters for error display and post-login redirect.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub user: Option<CurrentUser>,
    pub error: Option<&'static str>,
    pub next: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub user: Option<CurrentUser>,
    pub error: Option<&'static str>,
}

/// User-facing text for an error code carried in the query string.
#[must_use]
pub fn error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "Incorrect email or password.",
        "rate_limited" => "Too many attempts. Please wait a moment and try again.",
        "disabled" => "This account has been disabled.",
        "name" => "Please enter your name.",
        "email" => "Please enter a valid email address.",
        "phone" => "Please enter a valid phone number.",
        "password_mismatch" => "Passwords do not match.",
        "password_too_short" => "Password must be at least 6 characters.",
        "weak_password" => "Please choose a stronger password.",
        "email_taken" => "An account with this email already exists.",
        _ => "Something went wrong. Please try again.",
    }
}

/// Only same-site absolute paths are allowed as redirect targets.
#[must_use]
pub fn safe_next(next: &str) -> &str {
    let ok = next.starts_with('/') && !next.starts_with("//") && !next.contains('\\');
    if ok { next } else { "/account" }
}

fn login_error(code: &str, next: &str) -> Response {
    Redirect::to(&format!(
        "/auth/login?error={code}&next={}",
        urlencoding::encode(next)
    ))
    .into_response()
}

fn register_error(code: &str) -> Response {
    Redirect::to(&format!("/auth/register?error={code}")).into_response()
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    LoginTemplate {
        user,
        error: query.error.as_deref().map(error_message),
        next: safe_next(query.next.as_deref().unwrap_or_default()).to_string(),
    }
}

/// Handle login form submission.
#[instrument(skip_all, fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let next = safe_next(&form.next).to_string();
    let Ok(email) = Email::parse(&form.email) else {
        return Ok(login_error("credentials", &next));
    };

    let auth = match state.identity().sign_in(&email, &form.password).await {
        Ok(auth) => auth,
        Err(IdentityError::InvalidCredentials) => return Ok(login_error("credentials", &next)),
        Err(IdentityError::TooManyAttempts) => return Ok(login_error("rate_limited", &next)),
        Err(IdentityError::UserDisabled) => return Ok(login_error("disabled", &next)),
        Err(e) => return Err(e.into()),
    };

    // A missing profile only costs the WhatsApp signature, so sign in anyway
    let profile = match state
        .database()
        .get::<UserProfile>(&paths::user(&auth.local_id))
        .await
    {
        Ok(profile) => profile,
        Err(e) => {
            warn!(error = %e, "failed to load profile at sign-in");
            None
        }
    };

    let user = CurrentUser::new(auth.local_id, email, profile.as_ref());
    set_current_user(&session, &user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    info!(user_id = %user.id, "signed in");

    Ok(Redirect::to(&next).into_response())
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    RegisterTemplate {
        user,
        error: query.error.as_deref().map(error_message),
    }
}

/// Handle registration form submission.
///
/// Creates the Firebase account, stores the profile and signs the user in.
#[instrument(skip_all, fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let name = form.name.trim();
    if name.is_empty() {
        return Ok(register_error("name"));
    }
    let Ok(email) = Email::parse(&form.email) else {
        return Ok(register_error("email"));
    };
    let Ok(phone) = Phone::parse(&form.phone) else {
        return Ok(register_error("phone"));
    };
    if form.password != form.password_confirm {
        return Ok(register_error("password_mismatch"));
    }
    if form.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Ok(register_error("password_too_short"));
    }

    let auth = match state.identity().sign_up(&email, &form.password).await {
        Ok(auth) => auth,
        Err(IdentityError::EmailExists) => return Ok(register_error("email_taken")),
        Err(IdentityError::WeakPassword(_)) => return Ok(register_error("weak_password")),
        Err(IdentityError::TooManyAttempts) => return Ok(register_error("rate_limited")),
        Err(e) => return Err(e.into()),
    };

    let profile = UserProfile::new(name, email.as_str(), &phone.to_string(), Utc::now());
    state
        .database()
        .set(&paths::user(&auth.local_id), &profile)
        .await?;

    let user = CurrentUser::new(auth.local_id, email, Some(&profile));
    set_current_user(&session, &user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    info!(user_id = %user.id, "registered");

    Ok(Redirect::to("/account").into_response())
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/"))
}
