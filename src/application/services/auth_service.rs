//! Owner authentication via signed bearer tokens.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::AppError;
use crate::utils::code_generator::owner_prefix;
use serde_json::json;

type HmacSha256 = Hmac<Sha256>;

/// Issues and verifies owner tokens.
///
/// A token is `<owner_id>.<signature>` where the signature is the hex
/// HMAC-SHA256 of the owner id keyed by `signing_secret`. Nothing is stored
/// server-side; rotating the secret invalidates every issued token.
#[derive(Clone)]
pub struct AuthService {
    signing_secret: String,
}

impl AuthService {
    /// Creates a new authentication service.
    ///
    /// `signing_secret` must match the value used when tokens were issued.
    pub fn new(signing_secret: String) -> Self {
        Self { signing_secret }
    }

    fn mac(&self, owner_id: &str) -> Result<HmacSha256, AppError> {
        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes()).map_err(|e| {
            AppError::internal("Invalid signing key", json!({ "reason": e.to_string() }))
        })?;
        mac.update(owner_id.as_bytes());
        Ok(mac)
    }

    /// Issues a token for `owner_id`.
    ///
    /// Only owner ids that yield a routable short path prefix get a token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if [`owner_prefix`] rejects the
    /// owner id.
    pub fn issue_token(&self, owner_id: &str) -> Result<String, AppError> {
        owner_prefix(owner_id)?;

        let signature = hex::encode(self.mac(owner_id)?.finalize().into_bytes());
        Ok(format!("{owner_id}.{signature}"))
    }

    /// Verifies a token and returns the owner id it was issued for.
    ///
    /// The signature is compared in constant time.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the token is malformed or its
    /// signature does not match.
    pub fn verify(&self, token: &str) -> Result<String, AppError> {
        let invalid = || {
            AppError::unauthorized("Unauthorized", json!({ "reason": "Invalid owner token" }))
        };

        let (owner_id, signature) = token.rsplit_once('.').ok_or_else(invalid)?;
        if owner_id.is_empty() {
            return Err(invalid());
        }

        let signature = hex::decode(signature).map_err(|_| invalid())?;
        self.mac(owner_id)?
            .verify_slice(&signature)
            .map_err(|_| invalid())?;

        Ok(owner_id.to_string())
    }
}
