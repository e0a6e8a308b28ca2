use crate::{
    error::{AppError, Result},
    models::user::*,
    services::{AuthService, Database},
    utils::validation::single_error,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

const USER_COLUMNS: &str =
    "id, username, first_name, last_name, email, password_hash, date_joined";

/// 用户服务，处理注册、登录和修改密码
#[derive(Clone)]
pub struct UserService {
    db: Arc<Database>,
    auth_service: AuthService,
}

impl UserService {
    pub async fn new(db: Arc<Database>, auth_service: AuthService) -> Result<Self> {
        Ok(Self { db, auth_service })
    }

    /// 注册新用户。表单需已通过校验
    pub async fn create_user(&self, form: &SignupForm) -> Result<User> {
        debug!("Creating user: {}", form.username);

        if self.get_by_username(&form.username).await?.is_some() {
            return Err(AppError::ValidatorError(single_error(
                "username",
                "unique",
                "A user with that username already exists.",
            )));
        }

        let password_hash = self.auth_service.hash_password(&form.password1)?;

        let id = sqlx::query(
            "INSERT INTO users (username, first_name, last_name, email, password_hash, date_joined) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&form.username)
        .bind(form.first_name.trim())
        .bind(form.last_name.trim())
        .bind(form.email.trim())
        .bind(&password_hash)
        .bind(Utc::now())
        .execute(self.db.pool())
        .await?
        .last_insert_rowid();

        let user = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::internal("User vanished after insert"))?;

        info!("Created user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(user)
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = ?",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(user)
    }

    /// 按用户名获取用户，不存在时返回 404
    pub async fn get_required(&self, username: &str) -> Result<User> {
        self.get_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// 校验用户名和密码
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        debug!("Authenticating user: {}", username);

        let user = match self.get_by_username(username).await? {
            Some(user) => user,
            None => return Ok(None),
        };

        if self.auth_service.verify_password(password, &user.password_hash) {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    pub async fn change_password(&self, user: &User, form: &PasswordChangeForm) -> Result<()> {
        debug!("Changing password for user: {}", user.id);

        if !self
            .auth_service
            .verify_password(&form.old_password, &user.password_hash)
        {
            return Err(AppError::ValidatorError(single_error(
                "old_password",
                "password_incorrect",
                "Your old password was entered incorrectly. Please enter it again.",
            )));
        }

        let password_hash = self.auth_service.hash_password(&form.new_password1)?;

        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(&password_hash)
            .bind(user.id)
            .execute(self.db.pool())
            .await?;

        info!("Password changed for user {}", user.id);
        Ok(())
    }
}
