use blivalley_core::model::{Email, NewUser, User, UserId};

use super::SqliteRepository;
use super::mapping::{bool_to_i64, db_err, id_to_i64, map_user_row, user_id_from_i64};
use crate::repository::{StorageError, UserRepository};

const USER_COLUMNS: &str = "id, email, display_name, photo_url, provider, password_hash, theme, \
     notifications, capture_enabled, capture_open_apps, capture_browser_tabs, created_at";

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn insert_user(&self, user: &NewUser) -> Result<UserId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO users (email, display_name, photo_url, provider, password_hash, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(user.email.as_str())
        .bind(user.display_name.as_str())
        .bind(user.photo_url.as_deref())
        .bind(user.provider.as_str())
        .bind(user.password_hash.as_deref())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        user_id_from_i64(res.last_insert_rowid())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id_to_i64("user_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(map_user_row).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, StorageError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
        let row = sqlx::query(&sql)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(map_user_row).transpose()
    }

    async fn update_user(&self, user: &User) -> Result<(), StorageError> {
        let settings = user.settings();
        let capture = settings.session_capture();
        let res = sqlx::query(
            r"
            UPDATE users SET
                display_name = ?1,
                photo_url = ?2,
                password_hash = ?3,
                theme = ?4,
                notifications = ?5,
                capture_enabled = ?6,
                capture_open_apps = ?7,
                capture_browser_tabs = ?8
            WHERE id = ?9
            ",
        )
        .bind(user.display_name())
        .bind(user.photo_url())
        .bind(user.password_hash())
        .bind(settings.theme().as_str())
        .bind(bool_to_i64(settings.notifications()))
        .bind(bool_to_i64(capture.enabled))
        .bind(bool_to_i64(capture.capture_open_apps))
        .bind(bool_to_i64(capture.capture_browser_tabs))
        .bind(id_to_i64("user_id", user.id().value())?)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
