use std::sync::Arc;

use blivalley_core::model::{User, UserId, UserSettings, UserSettingsDraft};
use storage::repository::UserRepository;

use crate::error::UserServiceError;

/// Profile edits. `None` leaves a field unchanged; `Some(None)` clears the photo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub display_name: Option<String>,
    pub photo_url: Option<Option<String>>,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// # Errors
    ///
    /// Returns `UserServiceError::NotFound` if the account is gone.
    pub async fn profile(&self, user: UserId) -> Result<User, UserServiceError> {
        self.users
            .get_user(user)
            .await?
            .ok_or(UserServiceError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `UserServiceError::User` if the name or photo URL is invalid.
    pub async fn update_profile(
        &self,
        user: UserId,
        patch: ProfilePatch,
    ) -> Result<User, UserServiceError> {
        let mut current = self.profile(user).await?;
        if let Some(name) = patch.display_name {
            current.set_display_name(&name)?;
        }
        if let Some(photo_url) = patch.photo_url {
            current.set_photo_url(photo_url)?;
        }
        self.users.update_user(&current).await?;
        Ok(current)
    }

    /// # Errors
    ///
    /// Returns `UserServiceError::NotFound` if the account is gone.
    pub async fn settings(&self, user: UserId) -> Result<UserSettings, UserServiceError> {
        Ok(self.profile(user).await?.settings())
    }

    /// Validate a partial settings update and persist the result.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::Settings` if validation fails.
    pub async fn update_settings(
        &self,
        user: UserId,
        draft: UserSettingsDraft,
    ) -> Result<UserSettings, UserServiceError> {
        let mut current = self.profile(user).await?;
        let settings = draft.apply_to(current.settings())?;
        current.set_settings(settings);
        self.users.update_user(&current).await?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blivalley_core::model::{AuthProvider, NewUser, SettingsError, Theme};
    use blivalley_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    async fn setup() -> (UserService, UserId) {
        let repo = Arc::new(InMemoryRepository::new());
        let new = NewUser::new("ada@example.com", "Ada", None, AuthProvider::Github, None, fixed_now())
            .unwrap();
        let id = repo.insert_user(&new).await.unwrap();
        (UserService::new(repo), id)
    }

    #[tokio::test]
    async fn settings_update_is_partial_and_persisted() {
        let (svc, id) = setup().await;
        let saved = svc
            .update_settings(
                id,
                UserSettingsDraft {
                    theme: Some("light".into()),
                    notifications: Some(false),
                    ..UserSettingsDraft::new()
                },
            )
            .await
            .unwrap();
        assert_eq!(saved.theme(), Theme::Light);

        let loaded = svc.settings(id).await.unwrap();
        assert_eq!(loaded, saved);
        assert!(!loaded.notifications());
        assert!(!loaded.session_capture().enabled);
    }

    #[tokio::test]
    async fn unknown_theme_is_rejected() {
        let (svc, id) = setup().await;
        let err = svc
            .update_settings(
                id,
                UserSettingsDraft {
                    theme: Some("neon".into()),
                    ..UserSettingsDraft::new()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            UserServiceError::Settings(SettingsError::UnknownTheme(_))
        ));
    }

    #[tokio::test]
    async fn profile_patch_can_clear_photo() {
        let (svc, id) = setup().await;
        let user = svc
            .update_profile(
                id,
                ProfilePatch {
                    display_name: Some("Ada Lovelace".into()),
                    photo_url: Some(Some("https://img.example/ada.png".into())),
                },
            )
            .await
            .unwrap();
        assert_eq!(user.display_name(), "Ada Lovelace");
        assert!(user.photo_url().is_some());

        let user = svc
            .update_profile(
                id,
                ProfilePatch {
                    photo_url: Some(None),
                    ..ProfilePatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(user.photo_url(), None);
        assert!(matches!(
            svc.profile(UserId::new(999)).await.unwrap_err(),
            UserServiceError::NotFound
        ));
    }
}
