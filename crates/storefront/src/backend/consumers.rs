//! Consumer authentication, profile and address book.

use bazaar_core::api::ApiError;
use bazaar_core::{Address, AddressId, AddressInput, AuthToken, ConsumerProfile, ConsumerSession};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::instrument;

use super::Marketplace;

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// Registration details.
pub struct Registration {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: SecretString,
}

#[derive(Serialize)]
struct RegistrationBody<'a> {
    name: &'a str,
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
    password: &'a str,
}

/// Editable profile fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Marketplace {
    /// Exchange email and password for a consumer session.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` (with the backend's message) when the
    /// credentials are wrong.
    #[instrument(skip(self, password))]
    pub async fn login_consumer(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<ConsumerSession, ApiError> {
        self.inner
            .api
            .post(
                &["consumers", "login"],
                &Credentials {
                    email,
                    password: password.expose_secret(),
                },
                None,
            )
            .await
    }

    /// Create a consumer account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the registration.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register_consumer(
        &self,
        registration: &Registration,
    ) -> Result<ConsumerSession, ApiError> {
        self.inner
            .api
            .post(
                &["consumers", "register"],
                &RegistrationBody {
                    name: &registration.name,
                    email: &registration.email,
                    phone: registration.phone.as_deref(),
                    password: registration.password.expose_secret(),
                },
                None,
            )
            .await
    }

    /// The signed-in consumer's profile.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token has expired.
    #[instrument(skip(self, token))]
    pub async fn profile(&self, token: &AuthToken) -> Result<ConsumerProfile, ApiError> {
        self.inner
            .api
            .get(&["consumers", "me"], &[], Some(token))
            .await
    }

    /// Update the consumer's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the update.
    #[instrument(skip(self, token))]
    pub async fn update_profile(
        &self,
        token: &AuthToken,
        update: &ProfileUpdate,
    ) -> Result<ConsumerProfile, ApiError> {
        self.inner
            .api
            .put(&["consumers", "me"], update, Some(token))
            .await
    }

    /// The consumer's saved addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn addresses(&self, token: &AuthToken) -> Result<Vec<Address>, ApiError> {
        Ok(self
            .inner
            .api
            .get_page(&["consumers", "me", "addresses"], &[], Some(token))
            .await?
            .items)
    }

    /// One saved address.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the address does not exist.
    #[instrument(skip(self, token))]
    pub async fn address(&self, token: &AuthToken, id: &AddressId) -> Result<Address, ApiError> {
        self.inner
            .api
            .get(&["consumers", "me", "addresses", id.as_str()], &[], Some(token))
            .await
    }

    /// Save a new address.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the address.
    #[instrument(skip(self, token, input))]
    pub async fn create_address(
        &self,
        token: &AuthToken,
        input: &AddressInput,
    ) -> Result<Address, ApiError> {
        self.inner
            .api
            .post(&["consumers", "me", "addresses"], input, Some(token))
            .await
    }

    /// Replace a saved address.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the address.
    #[instrument(skip(self, token, input))]
    pub async fn update_address(
        &self,
        token: &AuthToken,
        id: &AddressId,
        input: &AddressInput,
    ) -> Result<Address, ApiError> {
        self.inner
            .api
            .put(
                &["consumers", "me", "addresses", id.as_str()],
                input,
                Some(token),
            )
            .await
    }

    /// Delete a saved address.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self, token))]
    pub async fn delete_address(&self, token: &AuthToken, id: &AddressId) -> Result<(), ApiError> {
        self.inner
            .api
            .delete(&["consumers", "me", "addresses", id.as_str()], Some(token))
            .await
    }
}
