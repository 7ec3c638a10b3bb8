//! Account route handlers: profile and address book.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use bazaar_core::{Address, AddressId, AddressInput, Zone, ZoneId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::{ApiError, ProfileUpdate};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{PageContext, RequireConsumer};
use crate::models::session_keys;
use crate::routes::inline_error;
use crate::state::AppState;

/// Longest accepted name, in characters.
const MAX_NAME_LENGTH: usize = 100;

/// Profile form data.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileForm {
    pub name: String,
    pub phone: Option<String>,
}

impl ProfileForm {
    /// Validate the form into a profile update.
    ///
    /// # Errors
    ///
    /// Returns a message when the name is blank or too long.
    pub fn to_update(&self) -> std::result::Result<ProfileUpdate, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Please enter your name.".to_string());
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(format!("Name must be at most {MAX_NAME_LENGTH} characters."));
        }
        Ok(ProfileUpdate {
            name: name.to_string(),
            phone: non_blank(self.phone.as_deref()),
        })
    }
}

/// Address form data.
#[derive(Debug, Default, Deserialize)]
pub struct AddressForm {
    pub label: Option<String>,
    #[serde(default)]
    pub recipient_name: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub line1: String,
    pub line2: Option<String>,
    #[serde(default)]
    pub city: String,
    pub zone_id: Option<String>,
    pub notes: Option<String>,
    /// Checkbox: present when ticked.
    pub is_default: Option<String>,
}

impl AddressForm {
    /// Validate the form into the backend's address payload.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first missing required field.
    pub fn to_input(&self) -> std::result::Result<AddressInput, String> {
        let required = |value: &str, field: &str| {
            let value = value.trim();
            if value.is_empty() {
                Err(format!("Please enter the {field}."))
            } else {
                Ok(value.to_string())
            }
        };

        Ok(AddressInput {
            label: non_blank(self.label.as_deref()),
            recipient_name: required(&self.recipient_name, "recipient's name")?,
            phone: non_blank(self.phone.as_deref()),
            line1: required(&self.line1, "street address")?,
            line2: non_blank(self.line2.as_deref()),
            city: required(&self.city, "city")?,
            zone_id: non_blank(self.zone_id.as_deref()).map(ZoneId::new),
            notes: non_blank(self.notes.as_deref()),
            is_default: self.is_default.is_some(),
        })
    }
}

impl From<&Address> for AddressForm {
    fn from(address: &Address) -> Self {
        Self {
            label: address.label.clone(),
            recipient_name: address.recipient_name.clone(),
            phone: address.phone.clone(),
            line1: address.line1.clone(),
            line2: address.line2.clone(),
            city: address.city.clone(),
            zone_id: address.zone_id.as_ref().map(ToString::to_string),
            notes: address.notes.clone(),
            is_default: address.is_default.then(String::new),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Address display data for the address book.
#[derive(Debug, Clone)]
pub struct AddressView {
    pub id: String,
    pub label: Option<String>,
    pub recipient_name: String,
    pub one_line: String,
    pub phone: Option<String>,
    pub zone_name: Option<String>,
    pub is_default: bool,
}

impl AddressView {
    fn new(address: &Address, zones: &[Zone]) -> Self {
        Self {
            id: address.id.to_string(),
            label: address.label.clone().filter(|l| !l.is_empty()),
            recipient_name: address.recipient_name.clone(),
            one_line: address.one_line(),
            phone: address.phone.clone(),
            zone_name: address
                .zone_id
                .as_ref()
                .and_then(|id| zones.iter().find(|z| &z.id == id))
                .map(|z| z.name.clone()),
            is_default: address.is_default,
        }
    }
}

/// Zone choice on the address form.
#[derive(Debug, Clone)]
pub struct ZoneChoice {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub page: PageContext,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub error: Option<String>,
    pub saved: bool,
}

/// Address book template.
#[derive(Template, WebTemplate)]
#[template(path = "account/addresses.html")]
pub struct AddressesTemplate {
    pub page: PageContext,
    pub addresses: Vec<AddressView>,
    pub error: Option<String>,
}

/// Address form template.
#[derive(Template, WebTemplate)]
#[template(path = "account/address_form.html")]
pub struct AddressFormTemplate {
    pub page: PageContext,
    /// Form target; `/account/addresses` or `/account/addresses/{id}`.
    pub action: String,
    pub editing: bool,
    pub label: String,
    pub recipient_name: String,
    pub phone: String,
    pub line1: String,
    pub line2: String,
    pub city: String,
    pub notes: String,
    pub is_default: bool,
    pub zones: Vec<ZoneChoice>,
    pub error: Option<String>,
}

impl AddressFormTemplate {
    fn new(
        page: PageContext,
        action: String,
        form: &AddressForm,
        zones: &[Zone],
        error: Option<String>,
    ) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            page,
            editing: action != "/account/addresses",
            action,
            label: text(&form.label),
            recipient_name: form.recipient_name.clone(),
            phone: text(&form.phone),
            line1: form.line1.clone(),
            line2: text(&form.line2),
            city: form.city.clone(),
            notes: text(&form.notes),
            is_default: form.is_default.is_some(),
            zones: zones
                .iter()
                .filter(|z| z.is_active)
                .map(|z| ZoneChoice {
                    id: z.id.to_string(),
                    name: z.name.clone(),
                    selected: form.zone_id.as_deref() == Some(z.id.as_str()),
                })
                .collect(),
            error,
        }
    }
}

fn address_action(id: &AddressId) -> String {
    format!("/account/addresses/{}", urlencoding::encode(id.as_str()))
}

fn address_not_found(err: ApiError) -> AppError {
    if err.is_not_found() {
        AppError::NotFound("that address".to_string())
    } else {
        err.into()
    }
}

/// Zones for the address form; the form still works without them.
async fn zones_or_empty(state: &AppState) -> Vec<Zone> {
    state.marketplace().zones().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load zones for address form");
        Vec::new()
    })
}

// =============================================================================
// Profile
// =============================================================================

/// Display the profile.
#[instrument(skip(state, page, consumer))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    RequireConsumer(consumer): RequireConsumer,
) -> Result<impl IntoResponse> {
    let profile = state.marketplace().profile(&consumer.token).await?;

    Ok(ProfileTemplate {
        page,
        name: profile.name,
        email: profile.email,
        phone: profile.phone.unwrap_or_default(),
        error: None,
        saved: false,
    })
}

/// Update the profile.
#[instrument(skip(state, page, session, consumer, form))]
pub async fn update(
    State(state): State<AppState>,
    page: PageContext,
    session: Session,
    RequireConsumer(mut consumer): RequireConsumer,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    let rerender = |page, error| ProfileTemplate {
        page,
        name: form.name.clone(),
        email: consumer.email.clone(),
        phone: form.phone.clone().unwrap_or_default(),
        error: Some(error),
        saved: false,
    };

    let update = match form.to_update() {
        Ok(update) => update,
        Err(error) => {
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, rerender(page, error)).into_response());
        }
    };

    match state
        .marketplace()
        .update_profile(&consumer.token, &update)
        .await
    {
        Ok(profile) => {
            consumer.name.clone_from(&profile.name);
            session
                .insert(session_keys::CURRENT_CONSUMER, &consumer)
                .await?;

            Ok(ProfileTemplate {
                page: PageContext {
                    consumer_name: Some(profile.name.clone()),
                    ..page
                },
                name: profile.name,
                email: profile.email,
                phone: profile.phone.unwrap_or_default(),
                error: None,
                saved: true,
            }
            .into_response())
        }
        Err(e) => {
            let error = inline_error(e)?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, rerender(page, error)).into_response())
        }
    }
}

// =============================================================================
// Address Book
// =============================================================================

/// Display the address book.
#[instrument(skip(state, page, consumer))]
pub async fn addresses(
    State(state): State<AppState>,
    page: PageContext,
    RequireConsumer(consumer): RequireConsumer,
) -> Result<impl IntoResponse> {
    let marketplace = state.marketplace();
    let (addresses, zones) = tokio::join!(
        marketplace.addresses(&consumer.token),
        zones_or_empty(&state)
    );

    Ok(AddressesTemplate {
        page,
        addresses: addresses?
            .iter()
            .map(|a| AddressView::new(a, &zones))
            .collect(),
        error: None,
    })
}

/// Display the new address form.
#[instrument(skip(state, page, _consumer))]
pub async fn new_address(
    State(state): State<AppState>,
    page: PageContext,
    RequireConsumer(_consumer): RequireConsumer,
) -> impl IntoResponse {
    let zones = zones_or_empty(&state).await;
    AddressFormTemplate::new(
        page,
        "/account/addresses".to_string(),
        &AddressForm::default(),
        &zones,
        None,
    )
}

/// Create an address.
#[instrument(skip(state, page, consumer, form))]
pub async fn create_address(
    State(state): State<AppState>,
    page: PageContext,
    RequireConsumer(consumer): RequireConsumer,
    Form(form): Form<AddressForm>,
) -> Result<Response> {
    let action = "/account/addresses".to_string();
    let result = match form.to_input() {
        Ok(input) => state
            .marketplace()
            .create_address(&consumer.token, &input)
            .await
            .map_err(inline_error),
        Err(error) => Err(Ok(error)),
    };

    finish_address_form(&state, page, action, &form, result).await
}

/// Display the edit form for an address.
#[instrument(skip(state, page, consumer))]
pub async fn edit_address(
    State(state): State<AppState>,
    page: PageContext,
    RequireConsumer(consumer): RequireConsumer,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = AddressId::new(id);
    let (address, zones) = tokio::join!(
        state.marketplace().address(&consumer.token, &id),
        zones_or_empty(&state)
    );
    let address = address.map_err(address_not_found)?;

    Ok(AddressFormTemplate::new(
        page,
        address_action(&id),
        &AddressForm::from(&address),
        &zones,
        None,
    ))
}

/// Update an address.
#[instrument(skip(state, page, consumer, form))]
pub async fn update_address(
    State(state): State<AppState>,
    page: PageContext,
    RequireConsumer(consumer): RequireConsumer,
    Path(id): Path<String>,
    Form(form): Form<AddressForm>,
) -> Result<Response> {
    let id = AddressId::new(id);
    let result = match form.to_input() {
        Ok(input) => state
            .marketplace()
            .update_address(&consumer.token, &id, &input)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    Err(address_not_found(e))
                } else {
                    inline_error(e)
                }
            }),
        Err(error) => Err(Ok(error)),
    };

    finish_address_form(&state, page, address_action(&id), &form, result).await
}

/// Delete an address.
#[instrument(skip(state, page, consumer))]
pub async fn delete_address(
    State(state): State<AppState>,
    page: PageContext,
    RequireConsumer(consumer): RequireConsumer,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = AddressId::new(id);
    let marketplace = state.marketplace();

    match marketplace.delete_address(&consumer.token, &id).await {
        Ok(()) => Ok(Redirect::to("/account/addresses").into_response()),
        Err(e) => {
            let error = inline_error(e)?;
            let (addresses, zones) = tokio::join!(
                marketplace.addresses(&consumer.token),
                zones_or_empty(&state)
            );
            Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                AddressesTemplate {
                    page,
                    addresses: addresses?
                        .iter()
                        .map(|a| AddressView::new(a, &zones))
                        .collect(),
                    error: Some(error),
                },
            )
                .into_response())
        }
    }
}

/// Redirect to the address book on success, or re-render the form.
///
/// The error side is itself a result: `Ok(message)` is shown on the form,
/// `Err` propagates (expired session, missing address).
async fn finish_address_form(
    state: &AppState,
    page: PageContext,
    action: String,
    form: &AddressForm,
    result: std::result::Result<Address, Result<String>>,
) -> Result<Response> {
    match result {
        Ok(address) => {
            tracing::info!(address_id = %address.id, "Address saved");
            Ok(Redirect::to("/account/addresses").into_response())
        }
        Err(error) => {
            let error = error?;
            let zones = zones_or_empty(state).await;
            Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                AddressFormTemplate::new(page, action, form, &zones, Some(error)),
            )
                .into_response())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_form_validation() {
        let form = ProfileForm {
            name: "  Ada  ".into(),
            phone: Some(" ".into()),
        };
        assert_eq!(
            form.to_update().unwrap(),
            ProfileUpdate {
                name: "Ada".into(),
                phone: None
            }
        );

        let blank = ProfileForm::default();
        assert_eq!(blank.to_update().unwrap_err(), "Please enter your name.");
    }

    #[test]
    fn test_address_form_requires_fields() {
        let form = AddressForm {
            recipient_name: "Ada".into(),
            line1: "1 Main St".into(),
            ..AddressForm::default()
        };
        assert_eq!(form.to_input().unwrap_err(), "Please enter the city.");
    }

    #[test]
    fn test_address_form_to_input() {
        let form = AddressForm {
            label: Some("Home".into()),
            recipient_name: "Ada".into(),
            line1: "1 Main St".into(),
            line2: Some(String::new()),
            city: "Springfield".into(),
            zone_id: Some("3".into()),
            is_default: Some("on".into()),
            ..AddressForm::default()
        };
        let input = form.to_input().unwrap();
        assert_eq!(input.label.as_deref(), Some("Home"));
        assert_eq!(input.line2, None);
        assert_eq!(input.zone_id, Some(ZoneId::new("3")));
        assert!(input.is_default);
    }

    #[test]
    fn test_address_form_template_marks_zone() {
        let zones: Vec<Zone> = serde_json::from_str(
            r#"[{"id": 3, "name": "Downtown", "deliveryFee": 3},
                {"id": 4, "name": "Closed", "deliveryFee": 3, "isActive": false}]"#,
        )
        .unwrap();
        let form = AddressForm {
            zone_id: Some("3".into()),
            ..AddressForm::default()
        };
        let template = AddressFormTemplate::new(
            PageContext::default(),
            "/account/addresses/7".into(),
            &form,
            &zones,
            None,
        );
        assert!(template.editing);
        assert_eq!(template.zones.len(), 1);
        assert!(template.zones.first().unwrap().selected);
    }
}
