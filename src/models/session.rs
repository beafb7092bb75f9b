//! Authenticated user and persisted session.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Profile of a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
}

impl User {
    /// Display name, defaulting to the local part of the email.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            default_name(&self.email)
        } else {
            &self.name
        }
    }
}

/// Local part of an email address.
pub(crate) fn default_name(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

/// A session token plus the expiry claim decoded from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default = "bearer")]
    pub token_type: String,
    pub user: User,
    /// Advisory only: read from the token without verifying its signature
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

fn bearer() -> String {
    "bearer".into()
}

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    exp: Option<i64>,
}

impl Session {
    pub fn new(access_token: impl Into<String>, user: User) -> Self {
        let access_token = access_token.into();
        let expires_at = token_expiry(&access_token);
        Self {
            access_token,
            token_type: bearer(),
            user,
            expires_at,
        }
    }

    /// Tokens without an `exp` claim never expire client-side.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|exp| now < exp)
    }
}

/// Read the `exp` claim of a JWT. Opaque or malformed tokens yield `None`.
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    match jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation) {
        Ok(data) => data
            .claims
            .exp
            .and_then(|exp| Utc.timestamp_opt(exp, 0).single()),
        Err(e) => {
            log::debug!("Session token is not a readable JWT: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header};

    fn token_with_exp(exp: i64) -> String {
        let claims = serde_json::json!({ "sub": "ada@example.com", "exp": exp });
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"server-side-secret"),
        )
        .unwrap()
    }

    fn user() -> User {
        User {
            id: "u1".into(),
            email: "ada@example.com".into(),
            name: String::new(),
        }
    }

    #[test]
    fn expiry_is_read_without_the_signing_key() {
        let token = token_with_exp(1_900_000_000);
        let expiry = token_expiry(&token).unwrap();
        assert_eq!(expiry.timestamp(), 1_900_000_000);
    }

    #[test]
    fn session_validity_follows_exp_claim() {
        let session = Session::new(token_with_exp(1_700_000_000), user());
        let before = Utc.timestamp_opt(1_699_999_999, 0).unwrap();
        let after = Utc.timestamp_opt(1_700_000_001, 0).unwrap();
        assert!(session.is_valid_at(before));
        assert!(!session.is_valid_at(after));
    }

    #[test]
    fn opaque_token_has_no_expiry() {
        let session = Session::new("not-a-jwt", user());
        assert!(session.expires_at.is_none());
        assert!(session.is_valid_at(Utc::now()));
    }

    #[test]
    fn display_name_defaults_to_email_local_part() {
        assert_eq!(user().display_name(), "ada");
    }
}
