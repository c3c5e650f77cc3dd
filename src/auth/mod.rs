//! Caller identity.
//!
//! The gateway only needs one capability from authentication: map a bearer
//! token to the caller's bank and account. [`IdentityOracle`] is that seam;
//! [`JwtIdentityOracle`] implements it with HS256 tokens and a user directory.

pub mod directory;
pub mod jwt;

pub use directory::{UserDirectory, UserRecord};
pub use jwt::{CUSTOMER_ROLE, Claims, JwtIdentityOracle, issue_token, issue_token_with_role};

use crate::core_types::{AccountId, BankName};
use crate::transfer::TransferError;

/// Who is calling, and which account they pay from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub bank: BankName,
    pub account: AccountId,
}

pub trait IdentityOracle: Send + Sync {
    /// Resolve a raw token (no `Bearer ` prefix).
    ///
    /// Errors: `MissingAuth`, `InvalidToken`, `Forbidden` (role may not
    /// pay), `UnknownUser`.
    fn resolve(&self, token: &str) -> Result<Identity, TransferError>;
}

/// Extract the token from an `Authorization` header value.
///
/// Accepts `Bearer <token>` as well as a bare token.
pub fn bearer_token(header: Option<&str>) -> Result<&str, TransferError> {
    let raw = header.map(str::trim).unwrap_or_default();
    let token = match raw.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ if raw.eq_ignore_ascii_case("bearer") => "",
        _ => raw,
    };
    if token.is_empty() {
        return Err(TransferError::MissingAuth);
    }
    Ok(token)
}

/// Fixed token table, for tests and in-process wiring.
#[derive(Debug, Default)]
pub struct StaticIdentityOracle {
    tokens: std::collections::HashMap<String, Identity>,
}

impl StaticIdentityOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, identity: Identity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }
}

impl IdentityOracle for StaticIdentityOracle {
    fn resolve(&self, token: &str) -> Result<Identity, TransferError> {
        if token.is_empty() {
            return Err(TransferError::MissingAuth);
        }
        self.tokens
            .get(token)
            .cloned()
            .ok_or(TransferError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_forms() {
        assert_eq!(bearer_token(Some("Bearer abc")).unwrap(), "abc");
        assert_eq!(bearer_token(Some("abc")).unwrap(), "abc");
        assert_eq!(bearer_token(Some("  Bearer  abc ")).unwrap(), "abc");
        assert_eq!(bearer_token(None), Err(TransferError::MissingAuth));
        assert_eq!(bearer_token(Some("Bearer ")), Err(TransferError::MissingAuth));
    }

    #[test]
    fn test_static_oracle() {
        let alice = Identity {
            username: "alice".into(),
            bank: BankName::from_index(1),
            account: AccountId::new("A1"),
        };
        let oracle = StaticIdentityOracle::new().with_token("t-alice", alice.clone());
        assert_eq!(oracle.resolve("t-alice").unwrap(), alice);
        assert_eq!(oracle.resolve("nope"), Err(TransferError::InvalidToken));
    }
}
