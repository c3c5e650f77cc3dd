//! HS256 bearer tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Identity, IdentityOracle, UserDirectory};
use crate::transfer::TransferError;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    #[serde(alias = "username")]
    pub sub: String, // Subject (username)
    #[serde(default)]
    pub role: String,
    pub exp: usize, // Expiration time (as UTC timestamp)
    #[serde(default)]
    pub iat: usize, // Issued at
}

/// The only role allowed to pay and to read a balance.
pub const CUSTOMER_ROLE: &str = "customer";

/// Mint a customer token for `username`. Development and test helper; the
/// gateway itself never issues credentials.
pub fn issue_token(secret: &str, username: &str, ttl: Duration) -> anyhow::Result<String> {
    issue_token_with_role(secret, username, CUSTOMER_ROLE, ttl)
}

pub fn issue_token_with_role(
    secret: &str,
    username: &str,
    role: &str,
    ttl: Duration,
) -> anyhow::Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: username.to_string(),
        role: role.to_string(),
        exp: (now + ttl).timestamp() as usize,
        iat: now.timestamp() as usize,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

pub struct JwtIdentityOracle {
    decoding_key: DecodingKey,
    validation: Validation,
    directory: UserDirectory,
}

impl JwtIdentityOracle {
    pub fn new(secret: &str, directory: UserDirectory) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            directory,
        }
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, TransferError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Token rejected");
                TransferError::InvalidToken
            })
    }
}

impl IdentityOracle for JwtIdentityOracle {
    fn resolve(&self, token: &str) -> Result<Identity, TransferError> {
        if token.is_empty() {
            return Err(TransferError::MissingAuth);
        }
        let claims = self.verify_token(token)?;
        if claims.role != CUSTOMER_ROLE {
            debug!(user = %claims.sub, role = %claims.role, "Role not allowed");
            return Err(TransferError::Forbidden(claims.role));
        }
        self.directory
            .identity(&claims.sub)
            .ok_or(TransferError::UnknownUser(claims.sub))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::AccountId;

    const SECRET: &str = "test-secret";

    fn oracle() -> JwtIdentityOracle {
        let dir = UserDirectory::from_json(
            r#"[{"username":"alice","account_no":"A1","bank_name":"bank1"}]"#,
        )
        .unwrap();
        JwtIdentityOracle::new(SECRET, dir)
    }

    #[test]
    fn test_resolve_valid_token() {
        let token = issue_token(SECRET, "alice", Duration::hours(1)).unwrap();
        let identity = oracle().resolve(&token).unwrap();
        assert_eq!(identity.username, "alice");
        assert_eq!(identity.account, AccountId::new("A1"));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = issue_token("other", "alice", Duration::hours(1)).unwrap();
        assert_eq!(oracle().resolve(&token), Err(TransferError::InvalidToken));
        assert_eq!(oracle().resolve("garbage"), Err(TransferError::InvalidToken));
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let token = issue_token(SECRET, "alice", Duration::hours(-2)).unwrap();
        assert_eq!(oracle().resolve(&token), Err(TransferError::InvalidToken));
    }

    #[test]
    fn test_non_customer_role_is_forbidden() {
        let token = issue_token_with_role(SECRET, "alice", "admin", Duration::hours(1)).unwrap();
        assert_eq!(
            oracle().resolve(&token),
            Err(TransferError::Forbidden("admin".into()))
        );
    }

    #[test]
    fn test_unknown_user() {
        let token = issue_token(SECRET, "mallory", Duration::hours(1)).unwrap();
        assert_eq!(
            oracle().resolve(&token),
            Err(TransferError::UnknownUser("mallory".into()))
        );
    }

    #[test]
    fn test_username_claim_alias() {
        // tokens minted with a `username` claim instead of `sub`
        #[derive(Serialize)]
        struct Legacy<'a> {
            username: &'a str,
            role: &'a str,
            exp: usize,
        }
        let claims = Legacy {
            username: "alice",
            role: "customer",
            exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_eq!(oracle().resolve(&token).unwrap().username, "alice");
    }
}
