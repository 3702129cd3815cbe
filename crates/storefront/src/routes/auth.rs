//! Authentication route handlers.
//!
//! The backend owns accounts and passwords. Login exchanges credentials for
//! the user record and stores it in the session; logout forgets it. Failures
//! redirect back to the form with an `?error=` code.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use novashop_core::{Email, Identity};
use secrecy::SecretString;
use serde::Deserialize;

use super::NavView;
use crate::api::ApiError;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::session::SessionContext;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Query parameters for error/success display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Text for an `?error=` code.
fn error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "Invalid credentials",
        "registration" => "Registration failed",
        "email" => "Please enter a valid email address",
        "session" => "Could not start your session. Please try again.",
        _ => "Something went wrong. Please try again.",
    }
}

/// Text for a `?success=` code.
fn success_message(code: &str) -> Option<&'static str> {
    match code {
        "registered" => Some("Account created. Please log in."),
        _ => None,
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub nav: NavView,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub nav: NavView,
    pub error: Option<String>,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(
    session: SessionContext,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    LoginTemplate {
        nav: NavView::for_identity(&session.identity()),
        error: query.error.as_deref().map(|c| error_message(c).to_string()),
        success: query
            .success
            .as_deref()
            .and_then(success_message)
            .map(str::to_string),
    }
}

/// Handle login form submission.
pub async fn login(
    State(state): State<AppState>,
    session: SessionContext,
    Form(form): Form<LoginForm>,
) -> Response {
    let Ok(email) = Email::parse(&form.email) else {
        return Redirect::to("/auth/login?error=credentials").into_response();
    };
    let password = SecretString::from(form.password);

    match state.api().login(&email, &password).await {
        Ok(profile) => {
            let user_id = profile.id.clone();
            if let Err(e) = session.set_identity(Identity::from(profile)).await {
                tracing::error!("Failed to set session: {}", e);
                return Redirect::to("/auth/login?error=session").into_response();
            }

            set_sentry_user(&user_id, Some(email.as_str()));
            tracing::info!(user_id = %user_id, "User logged in");
            Redirect::to("/").into_response()
        }
        Err(ApiError::InvalidCredentials) => {
            tracing::info!("Login rejected");
            Redirect::to("/auth/login?error=credentials").into_response()
        }
        Err(e) => {
            tracing::warn!("Login failed: {}", e);
            Redirect::to("/auth/login?error=unavailable").into_response()
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(
    session: SessionContext,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    RegisterTemplate {
        nav: NavView::for_identity(&session.identity()),
        error: query.error.as_deref().map(|c| error_message(c).to_string()),
    }
}

/// Handle registration form submission.
///
/// Does not sign the new user in; they are sent to the login page.
pub async fn register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Response {
    let Ok(email) = Email::parse(&form.email) else {
        return Redirect::to("/auth/register?error=email").into_response();
    };
    let password = SecretString::from(form.password);

    match state
        .api()
        .register(form.name.trim(), &email, &password)
        .await
    {
        Ok(()) => {
            tracing::info!("Account registered");
            Redirect::to("/auth/login?success=registered").into_response()
        }
        Err(e) => {
            tracing::warn!("Registration failed: {}", e);
            Redirect::to("/auth/register?error=registration").into_response()
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
///
/// # Errors
///
/// Returns an error if the session record cannot be removed.
pub async fn logout(session: SessionContext) -> Result<Redirect, AppError> {
    session.clear().await?;
    clear_sentry_user();
    Ok(Redirect::to("/"))
}
