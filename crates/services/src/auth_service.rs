use std::sync::Arc;

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use blivalley_core::Clock;
use blivalley_core::model::{AuthProvider, Email, NewUser, User, UserId};
use storage::repository::{StorageError, UserRepository};
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::token::TokenIssuer;

pub const MIN_PASSWORD_LEN: usize = 8;

/// A signed-in user together with a fresh bearer token.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

/// Identity asserted by an external provider after it has been verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderIdentity {
    pub email: String,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub provider: AuthProvider,
}

/// Credential and provider sign-in, token issue and verification.
#[derive(Clone)]
pub struct AuthService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    tokens: TokenIssuer,
    argon2: Argon2<'static>,
    /// Verified against when there is no real hash, so a miss costs the same.
    dummy_hash: Option<String>,
}

impl AuthService {
    #[must_use]
    pub fn new(clock: Clock, users: Arc<dyn UserRepository>, tokens: TokenIssuer) -> Self {
        let argon2 = Argon2::default();
        let salt = SaltString::generate(&mut OsRng);
        let dummy_hash = argon2
            .hash_password(b"blivalley-unused-password", &salt)
            .map(|hash| hash.to_string())
            .ok();
        Self {
            clock,
            users,
            tokens,
            argon2,
            dummy_hash,
        }
    }

    /// Create a credentials account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` for short passwords, `AuthError::User`
    /// for an invalid email or name, and `AuthError::EmailTaken` for duplicates.
    pub async fn register(
        &self,
        email: &str,
        display_name: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            });
        }
        let hash = self.hash_password(password)?;
        let new = NewUser::new(
            email,
            display_name,
            None,
            AuthProvider::Credentials,
            Some(hash),
            self.clock.now(),
        )?;

        let id = match self.users.insert_user(&new).await {
            Ok(id) => id,
            Err(StorageError::Conflict) => return Err(AuthError::EmailTaken),
            Err(e) => return Err(e.into()),
        };
        info!(user = %id, "user registered");
        self.session_for(new.assign_id(id))
    }

    /// Check an email/password pair.
    ///
    /// # Errors
    ///
    /// Every mismatch is `AuthError::InvalidCredentials`, whether the account
    /// is missing, has no password, or the password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let Ok(email) = Email::parse(email) else {
            return Err(AuthError::InvalidCredentials);
        };
        let Some(user) = self.users.find_by_email(&email).await? else {
            debug!("login for unknown email");
            self.verify_against_dummy(password);
            return Err(AuthError::InvalidCredentials);
        };
        let Some(stored) = user.password_hash() else {
            debug!(user = %user.id(), "login for account without password");
            self.verify_against_dummy(password);
            return Err(AuthError::InvalidCredentials);
        };
        if !self.verify_password(password, stored) {
            debug!(user = %user.id(), "login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }
        self.session_for(user)
    }

    /// Find or create the account for a verified provider identity and sign it in.
    /// Existing accounts of the same provider get its display name and photo.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::User` if the identity does not validate, and
    /// `AuthError::AccountNotLinked` if the email belongs to an account of
    /// another provider or to a password account.
    pub async fn sign_in_with_provider(
        &self,
        identity: ProviderIdentity,
    ) -> Result<AuthSession, AuthError> {
        let email = Email::parse(&identity.email)?;
        if let Some(mut user) = self.users.find_by_email(&email).await? {
            if user.provider() != identity.provider {
                warn!(
                    user = %user.id(),
                    account = user.provider().as_str(),
                    provider = identity.provider.as_str(),
                    "provider sign-in refused for account of another provider"
                );
                return Err(AuthError::AccountNotLinked);
            }
            user.set_display_name(&identity.display_name)?;
            if identity.photo_url.is_some() {
                user.set_photo_url(identity.photo_url)?;
            }
            self.users.update_user(&user).await?;
            debug!(user = %user.id(), provider = identity.provider.as_str(), "provider sign-in");
            return self.session_for(user);
        }

        let new = NewUser::new(
            email.as_str(),
            &identity.display_name,
            identity.photo_url,
            identity.provider,
            None,
            self.clock.now(),
        )?;
        let id = match self.users.insert_user(&new).await {
            Ok(id) => id,
            Err(StorageError::Conflict) => return Err(AuthError::AccountNotLinked),
            Err(e) => return Err(e.into()),
        };
        info!(user = %id, provider = identity.provider.as_str(), "user created from provider sign-in");
        self.session_for(new.assign_id(id))
    }

    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is bad or expired.
    pub fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        self.tokens.verify(token)
    }

    fn session_for(&self, user: User) -> Result<AuthSession, AuthError> {
        let token = self.tokens.issue(&user)?;
        Ok(AuthSession { user, token })
    }

    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hash(e.to_string()))
    }

    fn verify_against_dummy(&self, password: &str) {
        if let Some(dummy) = &self.dummy_hash {
            let _ = self.verify_password(password, dummy);
        }
    }

    fn verify_password(&self, password: &str, stored: &str) -> bool {
        PasswordHash::new(stored)
            .is_ok_and(|parsed| self.argon2.verify_password(password.as_bytes(), &parsed).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blivalley_core::time::fixed_now;
    use chrono::Duration;
    use storage::repository::Storage;

    fn service() -> AuthService {
        let clock = Clock::manual(fixed_now());
        let tokens = TokenIssuer::new(b"test-secret", Duration::hours(1), clock.clone());
        AuthService::new(clock, Storage::in_memory().users, tokens)
    }

    #[tokio::test]
    async fn register_then_login() {
        let auth = service();
        let registered = auth
            .register("Ada@Example.com", "Ada", "correct horse")
            .await
            .unwrap();
        assert_eq!(registered.user.email().as_str(), "ada@example.com");
        assert_ne!(registered.user.password_hash(), Some("correct horse"));
        assert_eq!(auth.verify(&registered.token).unwrap(), registered.user.id());

        let session = auth.login("ada@example.com", "correct horse").await.unwrap();
        assert_eq!(session.user.id(), registered.user.id());
    }

    #[tokio::test]
    async fn login_failures_look_the_same() {
        let auth = service();
        auth.register("ada@example.com", "Ada", "correct horse")
            .await
            .unwrap();

        for (email, password) in [
            ("ada@example.com", "wrong password"),
            ("nobody@example.com", "correct horse"),
            ("not an email", "correct horse"),
        ] {
            let err = auth.login(email, password).await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials), "{email}");
        }
    }

    #[tokio::test]
    async fn register_rejects_short_password_and_duplicates() {
        let auth = service();
        assert!(matches!(
            auth.register("ada@example.com", "Ada", "short").await.unwrap_err(),
            AuthError::WeakPassword { min: MIN_PASSWORD_LEN }
        ));
        auth.register("ada@example.com", "Ada", "long enough")
            .await
            .unwrap();
        assert!(matches!(
            auth.register("ADA@example.com", "Ada", "long enough")
                .await
                .unwrap_err(),
            AuthError::EmailTaken
        ));
    }

    #[tokio::test]
    async fn provider_sign_in_upserts() {
        let auth = service();
        let identity = ProviderIdentity {
            email: "grace@example.com".into(),
            display_name: "Grace".into(),
            photo_url: None,
            provider: AuthProvider::Google,
        };
        let first = auth.sign_in_with_provider(identity.clone()).await.unwrap();
        assert_eq!(first.user.provider(), AuthProvider::Google);
        assert_eq!(first.user.password_hash(), None);

        let second = auth
            .sign_in_with_provider(ProviderIdentity {
                display_name: "Grace H.".into(),
                photo_url: Some("https://img.example/grace.png".into()),
                ..identity
            })
            .await
            .unwrap();
        assert_eq!(second.user.id(), first.user.id());
        assert_eq!(second.user.display_name(), "Grace H.");

        let err = auth
            .login("grace@example.com", "anything at all")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn provider_cannot_claim_password_account() {
        let auth = service();
        let owner = auth
            .register("victim@example.com", "Victim", "correct horse")
            .await
            .unwrap();

        let err = auth
            .sign_in_with_provider(ProviderIdentity {
                email: "Victim@Example.com".into(),
                display_name: "Attacker".into(),
                photo_url: None,
                provider: AuthProvider::Github,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccountNotLinked));

        let session = auth
            .login("victim@example.com", "correct horse")
            .await
            .unwrap();
        assert_eq!(session.user.id(), owner.user.id());
        assert_eq!(session.user.display_name(), "Victim");
        assert_eq!(session.user.provider(), AuthProvider::Credentials);
    }

    #[tokio::test]
    async fn provider_cannot_claim_other_provider_account() {
        let auth = service();
        let google = ProviderIdentity {
            email: "grace@example.com".into(),
            display_name: "Grace".into(),
            photo_url: None,
            provider: AuthProvider::Google,
        };
        auth.sign_in_with_provider(google.clone()).await.unwrap();

        let err = auth
            .sign_in_with_provider(ProviderIdentity {
                display_name: "Someone else".into(),
                provider: AuthProvider::Github,
                ..google.clone()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccountNotLinked));

        let again = auth.sign_in_with_provider(google).await.unwrap();
        assert_eq!(again.user.display_name(), "Grace");
    }

    #[tokio::test]
    async fn misses_still_run_a_hash_check() {
        let auth = service();
        let dummy = auth.dummy_hash.as_deref().expect("dummy hash");
        assert!(PasswordHash::new(dummy).is_ok());
        assert!(!auth.verify_password("correct horse", dummy));

        let provider_only = auth
            .sign_in_with_provider(ProviderIdentity {
                email: "grace@example.com".into(),
                display_name: "Grace".into(),
                photo_url: None,
                provider: AuthProvider::Google,
            })
            .await
            .unwrap();
        assert_eq!(provider_only.user.password_hash(), None);
        assert!(matches!(
            auth.login("grace@example.com", "correct horse").await.unwrap_err(),
            AuthError::InvalidCredentials
        ));
    }
}
