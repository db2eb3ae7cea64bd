//! Service requests: device maintenance and custom product inquiries.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument};
use vapeshop_core::{NewServiceRequest, ServiceKind, whatsapp};
use vapeshop_firebase::paths;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::state::AppState;

/// Longest description accepted, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 2000;

/// Query parameters for the services page.
#[derive(Debug, Deserialize)]
pub struct ServicesQuery {
    pub kind: Option<String>,
    pub error: Option<String>,
}

/// Service request form data.
#[derive(Debug, Deserialize)]
pub struct ServiceForm {
    pub kind: String,
    #[serde(default)]
    pub description: String,
    pub device: Option<String>,
    pub product: Option<String>,
}

/// Services page template.
#[derive(Template, WebTemplate)]
#[template(path = "services.html")]
pub struct ServicesTemplate {
    pub user: Option<CurrentUser>,
    pub maintenance_selected: bool,
    pub error: Option<&'static str>,
}

fn error_message(code: &str) -> &'static str {
    match code {
        "description" => "Please describe what you need.",
        "too_long" => "Description is too long.",
        "device" => "Please tell us which device needs maintenance.",
        "product" => "Please tell us which product you are looking for.",
        _ => "Something went wrong. Please try again.",
    }
}

fn is_blank(value: Option<&String>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// Check a submitted form, returning the error code to show.
fn validate(kind: ServiceKind, form: &ServiceForm) -> std::result::Result<(), &'static str> {
    let description = form.description.trim();
    if description.is_empty() {
        return Err("description");
    }
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err("too_long");
    }
    match kind {
        ServiceKind::Maintenance if is_blank(form.device.as_ref()) => Err("device"),
        ServiceKind::ProductRequest if is_blank(form.product.as_ref()) => Err("product"),
        _ => Ok(()),
    }
}

/// Display the service request forms.
pub async fn page(
    RequireAuth(user): RequireAuth,
    Query(query): Query<ServicesQuery>,
) -> impl IntoResponse {
    let kind = query
        .kind
        .as_deref()
        .and_then(|k| k.parse::<ServiceKind>().ok())
        .unwrap_or(ServiceKind::ProductRequest);

    ServicesTemplate {
        user: Some(user),
        maintenance_selected: kind == ServiceKind::Maintenance,
        error: query.error.as_deref().map(error_message),
    }
}

/// Store a service request and hand the customer off to WhatsApp.
#[instrument(skip_all, fields(user_id = %user.id, kind = %form.kind))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ServiceForm>,
) -> Result<Response> {
    let Ok(kind) = form.kind.parse::<ServiceKind>() else {
        return Ok(Redirect::to("/services?error=kind").into_response());
    };
    if let Err(code) = validate(kind, &form) {
        return Ok(Redirect::to(&format!("/services?kind={kind}&error={code}")).into_response());
    }

    let request = NewServiceRequest {
        kind,
        description: form.description,
        device: form.device.filter(|_| kind == ServiceKind::Maintenance),
        product: form.product.filter(|_| kind == ServiceKind::ProductRequest),
    }
    .into_request(Utc::now());

    let key = state
        .database()
        .push(&paths::services(&user.id, kind), &request)
        .await?;
    info!(request = %key, "service request stored");

    let message = whatsapp::service_message(user.customer(), kind, &key, &request);
    Ok(Redirect::to(&whatsapp::chat_link(&state.config().whatsapp_number, &message)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(description: &str, device: Option<&str>, product: Option<&str>) -> ServiceForm {
        ServiceForm {
            kind: String::new(),
            description: description.to_string(),
            device: device.map(str::to_string),
            product: product.map(str::to_string),
        }
    }

    #[test]
    fn test_maintenance_needs_device() {
        assert_eq!(
            validate(ServiceKind::Maintenance, &form("Won't fire", Some("  "), None)),
            Err("device")
        );
        assert_eq!(
            validate(ServiceKind::Maintenance, &form("Won't fire", Some("Drag X"), None)),
            Ok(())
        );
    }

    #[test]
    fn test_product_request_needs_product() {
        assert_eq!(
            validate(ServiceKind::ProductRequest, &form("Please stock it", None, None)),
            Err("product")
        );
    }

    #[test]
    fn test_description_required() {
        assert_eq!(
            validate(ServiceKind::ProductRequest, &form("   ", None, Some("Salt 50"))),
            Err("description")
        );
        let long = "x".repeat(MAX_DESCRIPTION_CHARS + 1);
        assert_eq!(
            validate(ServiceKind::ProductRequest, &form(&long, None, Some("Salt 50"))),
            Err("too_long")
        );
    }
}
