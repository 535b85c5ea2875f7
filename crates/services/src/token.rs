use blivalley_core::Clock;
use blivalley_core::model::{User, UserId};
use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 168;

/// Bearer token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 bearer tokens.
///
/// Expiry is checked against the service clock, not the system time.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    clock: Clock,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(secret: &[u8], ttl: Duration, clock: Clock) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
            clock,
        }
    }

    /// Random per-process secret. Tokens die with the process.
    #[must_use]
    pub fn ephemeral(ttl: Duration, clock: Clock) -> Self {
        let mut secret = [0_u8; 32];
        rand::rng().fill_bytes(&mut secret);
        Self::new(&secret, ttl, clock)
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// # Errors
    ///
    /// Returns `AuthError::Token` if encoding fails or the expiry is out of range.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let now = self.clock.now();
        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::Token("token lifetime out of range".into()))?;
        let claims = Claims {
            sub: user.id().to_string(),
            email: user.email().as_str().to_owned(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Token(e.to_string()))
    }

    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for bad signatures, malformed claims
    /// or expired tokens.
    pub fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| AuthError::InvalidToken)?
            .claims;
        if claims.exp <= self.clock.now().timestamp() {
            return Err(AuthError::InvalidToken);
        }
        claims
            .sub
            .parse::<UserId>()
            .map_err(|_| AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blivalley_core::model::{AuthProvider, NewUser};
    use blivalley_core::time::fixed_now;

    fn user() -> User {
        NewUser::new("ada@example.com", "Ada", None, AuthProvider::Github, None, fixed_now())
            .unwrap()
            .assign_id(UserId::new(42))
    }

    #[test]
    fn issued_token_verifies_until_expiry() {
        let clock = Clock::manual(fixed_now());
        let issuer = TokenIssuer::new(b"secret", Duration::hours(1), clock.clone());
        let token = issuer.issue(&user()).unwrap();
        assert_eq!(issuer.verify(&token).unwrap(), UserId::new(42));

        clock.advance(Duration::hours(1));
        assert!(matches!(issuer.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn other_secret_is_rejected() {
        let token = TokenIssuer::new(b"one", Duration::hours(1), Clock::fixed(fixed_now()))
            .issue(&user())
            .unwrap();
        let other = TokenIssuer::new(b"two", Duration::hours(1), Clock::fixed(fixed_now()));
        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken)));
        assert!(matches!(other.verify("not-a-jwt"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn oversized_ttl_is_an_error() {
        let issuer = TokenIssuer::new(b"secret", Duration::days(100_000_000), Clock::fixed(fixed_now()));
        assert!(matches!(issuer.issue(&user()), Err(AuthError::Token(_))));
    }
}
