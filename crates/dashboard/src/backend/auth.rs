//! Merchant sign-in.

use bazaar_core::MerchantSession;
use bazaar_core::api::ApiError;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::instrument;

use super::Marketplace;

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

impl Marketplace {
    /// Exchange email and password for a merchant session.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` (with the backend's message) when the
    /// credentials are wrong.
    #[instrument(skip(self, password))]
    pub async fn login_merchant(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<MerchantSession, ApiError> {
        self.inner
            .api
            .post(
                &["merchants", "login"],
                &Credentials {
                    email,
                    password: password.expose_secret(),
                },
                None,
            )
            .await
    }
}
