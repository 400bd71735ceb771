use crate::{
    config::auth::AuthConfig,
    error::{AppError, AppResult},
    models::{user, User, UserModel, UserRole},
    utils::{encode_session_token, hash_password, verify_password},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, SqlErr,
};

/// Already-validated registration fields.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub login: String,
    pub password: String,
    pub area: Option<String>,
    pub role: UserRole,
}

pub struct AuthService {
    db: DatabaseConnection,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            config: AuthConfig::from_env(),
        }
    }

    /// Register a new account and open a session for it.
    /// Returns (user_model, session_token).
    pub async fn register(&self, account: NewAccount) -> AppResult<(UserModel, String)> {
        if self.find_one(user::Column::Email, &account.email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
        if self.find_one(user::Column::Login, &account.login).await?.is_some() {
            return Err(AppError::Conflict("Login already in use".to_string()));
        }

        let password_hash = hash_password(&account.password, self.config.bcrypt_cost)?;
        let now = chrono::Utc::now().naive_utc();

        let new_user = user::ActiveModel {
            name: sea_orm::ActiveValue::Set(account.name),
            email: sea_orm::ActiveValue::Set(account.email),
            login: sea_orm::ActiveValue::Set(account.login),
            password_hash: sea_orm::ActiveValue::Set(password_hash),
            area: sea_orm::ActiveValue::Set(account.area),
            role: sea_orm::ActiveValue::Set(account.role),
            created_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        // Lost a race with a concurrent registration of the same email/login.
        let user = new_user.insert(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Email or login already in use".to_string())
            }
            _ => AppError::Database(e),
        })?;
        let token = encode_session_token(user.id)?;

        tracing::info!(user_id = user.id, role = %user.role, "account registered");
        Ok((user, token))
    }

    /// Returns (user_model, session_token).
    pub async fn login(&self, login: &str, password: &str) -> AppResult<(UserModel, String)> {
        if login.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Login and password are required".to_string(),
            ));
        }

        let user = self
            .find_one(user::Column::Login, login)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        let token = encode_session_token(user.id)?;
        Ok((user, token))
    }

    pub async fn get_user_by_id(&self, id: i32) -> AppResult<UserModel> {
        User::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    async fn find_one(&self, column: user::Column, value: &str) -> AppResult<Option<UserModel>> {
        let user = User::find()
            .filter(column.eq(value))
            .one(&self.db)
            .await?;
        Ok(user)
    }
}
