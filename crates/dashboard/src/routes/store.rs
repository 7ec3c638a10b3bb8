//! Store settings route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use bazaar_core::Store;
use serde::Deserialize;
use tracing::instrument;

use crate::backend::StoreUpdate;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{PageContext, RequireMerchant};
use crate::routes::{inline_error, optional_http_url, optional_text};
use crate::state::AppState;

/// Longest accepted store name, in characters.
pub const MAX_STORE_NAME_LENGTH: usize = 100;

/// Store settings form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub logo_url: String,
    #[serde(default)]
    pub banner_url: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    /// Checkbox; present when ticked.
    pub is_open: Option<String>,
}

impl StoreForm {
    #[must_use]
    pub const fn open(&self) -> bool {
        self.is_open.is_some()
    }

    /// Validate the form into a backend payload.
    ///
    /// # Errors
    ///
    /// Returns every problem found, in form order.
    pub fn to_update(&self) -> std::result::Result<StoreUpdate, Vec<String>> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push("Store name is required.".to_string());
        } else if name.chars().count() > MAX_STORE_NAME_LENGTH {
            errors.push(format!(
                "Store name must be at most {MAX_STORE_NAME_LENGTH} characters."
            ));
        }

        let mut url = |label: &str, value: &str| {
            optional_http_url(label, value).unwrap_or_else(|e| {
                errors.push(format!("{e}."));
                None
            })
        };
        let logo_url = url("Logo URL", &self.logo_url);
        let banner_url = url("Banner URL", &self.banner_url);

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(StoreUpdate {
            name: name.to_string(),
            description: optional_text(&self.description),
            logo_url,
            banner_url,
            address: optional_text(&self.address),
            phone: optional_text(&self.phone),
            is_open: self.open(),
        })
    }
}

impl From<&Store> for StoreForm {
    fn from(store: &Store) -> Self {
        Self {
            name: store.name.clone(),
            description: store.description.clone().unwrap_or_default(),
            logo_url: store.logo_url.clone().unwrap_or_default(),
            banner_url: store.banner_url.clone().unwrap_or_default(),
            address: store.address.clone().unwrap_or_default(),
            phone: store.phone.clone().unwrap_or_default(),
            is_open: store.is_open.then(|| "on".to_string()),
        }
    }
}

/// Store settings template.
#[derive(Template, WebTemplate)]
#[template(path = "store/edit.html")]
pub struct StoreTemplate {
    pub page: PageContext,
    pub form: StoreForm,
    /// Storefront handle, shown read-only.
    pub slug: String,
    pub errors: Vec<String>,
    pub saved: bool,
    pub max_name: usize,
}

/// Query parameters for the settings page.
#[derive(Debug, Deserialize)]
pub struct StoreQuery {
    pub saved: Option<u8>,
}

/// Display the store settings.
#[instrument(skip(state, page, merchant))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    RequireMerchant(merchant): RequireMerchant,
    Query(query): Query<StoreQuery>,
) -> Result<impl IntoResponse> {
    let store = fetch_store(&state, &merchant).await?;

    Ok(StoreTemplate {
        page,
        form: StoreForm::from(&store),
        slug: store.slug,
        errors: Vec::new(),
        saved: query.saved.is_some(),
        max_name: MAX_STORE_NAME_LENGTH,
    })
}

/// Save the store settings.
#[instrument(skip(state, page, merchant, form), fields(name = %form.name))]
pub async fn update(
    State(state): State<AppState>,
    page: PageContext,
    RequireMerchant(merchant): RequireMerchant,
    Form(form): Form<StoreForm>,
) -> Result<Response> {
    let errors = match form.to_update() {
        Ok(update) => match state
            .marketplace()
            .update_store(&merchant.token, &update)
            .await
        {
            Ok(store) => {
                tracing::info!(store_id = %store.id, "Store settings saved");
                return Ok(Redirect::to("/store?saved=1").into_response());
            }
            Err(e) if e.is_not_found() => {
                return Err(AppError::NotFound("your store".to_string()));
            }
            Err(e) => vec![inline_error(e)?],
        },
        Err(errors) => errors,
    };

    let slug = fetch_store(&state, &merchant)
        .await
        .map(|s| s.slug)
        .unwrap_or_default();

    Ok((
        StatusCode::UNPROCESSABLE_ENTITY,
        StoreTemplate {
            page,
            form,
            slug,
            errors,
            saved: false,
            max_name: MAX_STORE_NAME_LENGTH,
        },
    )
        .into_response())
}

async fn fetch_store(
    state: &AppState,
    merchant: &crate::models::CurrentMerchant,
) -> Result<Store> {
    state
        .marketplace()
        .my_store(&merchant.token)
        .await
        .map_err(|e| {
            if e.is_not_found() {
                AppError::NotFound("your store".to_string())
            } else {
                e.into()
            }
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn form() -> StoreForm {
        StoreForm {
            name: " Hive & Co ".to_string(),
            description: "Raw honey".to_string(),
            logo_url: "https://cdn.example/logo.png".to_string(),
            banner_url: String::new(),
            address: String::new(),
            phone: "555-0101".to_string(),
            is_open: Some("on".to_string()),
        }
    }

    #[test]
    fn test_valid_store_form() {
        let update = form().to_update().unwrap();
        assert_eq!(update.name, "Hive & Co");
        assert_eq!(update.banner_url, None);
        assert_eq!(update.address, None);
        assert_eq!(update.phone.as_deref(), Some("555-0101"));
        assert!(update.is_open);
    }

    #[test]
    fn test_closed_store() {
        let update = StoreForm {
            is_open: None,
            ..form()
        }
        .to_update()
        .unwrap();
        assert!(!update.is_open);
    }

    #[test]
    fn test_store_form_errors() {
        let errors = StoreForm {
            name: "x".repeat(MAX_STORE_NAME_LENGTH + 1),
            banner_url: "banner.png".to_string(),
            ..form()
        }
        .to_update()
        .unwrap_err();
        assert_eq!(errors, vec![
            "Store name must be at most 100 characters.".to_string(),
            "Banner URL must be a full http:// or https:// address.".to_string(),
        ]);

        let errors = StoreForm {
            name: String::new(),
            ..form()
        }
        .to_update()
        .unwrap_err();
        assert_eq!(errors, vec!["Store name is required.".to_string()]);
    }

    #[test]
    fn test_form_from_store() {
        let store: Store = serde_json::from_value(serde_json::json!({
            "id": 1, "name": "Hive", "slug": "hive", "isOpen": false
        }))
        .unwrap();
        let form = StoreForm::from(&store);
        assert_eq!(form.name, "Hive");
        assert!(!form.open());
        assert_eq!(form.logo_url, "");
    }
}
