//! Login, logout and account creation.
//!
//! ```text
//! login ──► verify password ──► issue token ──► SessionRegistry::try_open
//!                                                 └─ full ──► 403
//! logout ─► SessionRegistry::close(jti)
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use dine_core::account::Credentials;
use dine_core::{Role, User};
use dine_db::Database;

use crate::auth::{hash_password, verify_password, AuthUser, JwtManager};
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::sessions::SessionRegistry;

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Clone)]
pub struct AccountService {
    db: Database,
    jwt: Arc<JwtManager>,
    sessions: Arc<SessionRegistry>,
    config: Arc<ApiConfig>,
}

impl AccountService {
    pub fn new(
        db: Database,
        jwt: Arc<JwtManager>,
        sessions: Arc<SessionRegistry>,
        config: Arc<ApiConfig>,
    ) -> Self {
        AccountService {
            db,
            jwt,
            sessions,
            config,
        }
    }

    /// Checks the password and opens a session within the role's limit.
    pub async fn login(&self, credentials: Credentials) -> ApiResult<LoginResponse> {
        let (username, password) = credentials.validate_login()?;

        let record = self.db.users().find_by_username(&username).await?;
        let Some(record) = record else {
            warn!(username = %username, "Login for unknown user");
            return Err(ApiError::unauthorized("Invalid credentials"));
        };

        let hash = record.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| ApiError::internal(format!("Password check failed: {}", e)))?;
        if !matches {
            warn!(user_id = %record.user.id, "Login with wrong password");
            return Err(ApiError::unauthorized("Invalid credentials"));
        }

        let user = record.user;
        let limit = self.config.max_sessions(user.role);
        let (token, claims) = self.jwt.issue_session(&user.id, user.role)?;
        let session_id = claims.jti.unwrap_or_default();

        if let Err(active) = self.sessions.try_open(&user.id, &session_id, claims.exp, limit) {
            warn!(user_id = %user.id, role = %user.role, active, limit, "Login limit reached");
            return Err(ApiError::forbidden(login_limit_message(limit, active)));
        }

        info!(user_id = %user.id, role = %user.role, "Logged in");
        Ok(LoginResponse { token, user })
    }

    /// Ends the caller's session. Tokens without a session id have nothing
    /// to end.
    pub fn logout(&self, user: &AuthUser) {
        let closed = user
            .session_id
            .as_deref()
            .is_some_and(|session_id| self.sessions.close(&user.id, session_id));
        info!(user_id = %user.id, closed, "Logged out");
    }

    /// First admin account. Refused once any admin exists.
    pub async fn setup_admin(&self, credentials: Credentials) -> ApiResult<User> {
        if self.db.users().exists_with_role(Role::Admin).await? {
            return Err(ApiError::forbidden(
                "Admin user already exists. Use /api/auth/admin/create to create additional admins.",
            ));
        }
        self.create(credentials, Role::Admin).await
    }

    /// Another admin account. Open while no admin exists, afterwards only
    /// an admin caller may create one.
    pub async fn create_admin(&self, credentials: Credentials, caller: Option<&AuthUser>) -> ApiResult<User> {
        if self.db.users().exists_with_role(Role::Admin).await? {
            match caller {
                None => {
                    return Err(ApiError::unauthorized(
                        "Access token required. An admin already exists.",
                    ))
                }
                Some(caller) if !caller.is_admin() => {
                    return Err(ApiError::forbidden(
                        "Admin access required to create additional admins.",
                    ))
                }
                Some(_) => {}
            }
        }
        self.create(credentials, Role::Admin).await
    }

    /// Staff account, created by an admin.
    pub async fn create_staff(&self, credentials: Credentials) -> ApiResult<User> {
        self.create(credentials, Role::Staff).await
    }

    async fn create(&self, credentials: Credentials, role: Role) -> ApiResult<User> {
        let (username, password) = credentials.validate_new_account()?;

        if self.db.users().find_by_username(&username).await?.is_some() {
            return Err(username_taken());
        }

        let hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| ApiError::internal(format!("Password hashing failed: {}", e)))??;

        let user = match self.db.users().insert(&username, &hash, role).await {
            Ok(user) => user,
            Err(e) if e.is_unique_violation_on("username") => return Err(username_taken()),
            Err(e) => return Err(e.into()),
        };

        info!(user_id = %user.id, username = %user.username, role = %user.role, "Created account");
        Ok(user)
    }
}

fn username_taken() -> ApiError {
    ApiError::new(ErrorCode::Conflict, "Username already exists")
}

fn login_limit_message(limit: usize, active: usize) -> String {
    let plural = |n: usize| if n == 1 { "" } else { "s" };
    format!(
        "Login limit reached. Only {} concurrent login{} allowed. Currently {} active session{}.",
        limit,
        plural(limit),
        active,
        plural(active)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use dine_db::DbConfig;

    async fn service_with(config: ApiConfig) -> AccountService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let jwt = Arc::new(JwtManager::new(config.jwt_secret.clone(), 3600));
        AccountService::new(db, jwt, Arc::new(SessionRegistry::new()), Arc::new(config))
    }

    async fn service() -> AccountService {
        service_with(ApiConfig::default()).await
    }

    #[tokio::test]
    async fn test_setup_then_login() {
        let service = service().await;
        let admin = service
            .setup_admin(Credentials::new("owner", "hunter22"))
            .await
            .unwrap();
        assert_eq!(admin.role, Role::Admin);

        let response = service
            .login(Credentials::new("owner", "hunter22"))
            .await
            .unwrap();
        assert_eq!(response.user.id, admin.id);

        let claims = service.jwt.validate_token(&response.token).unwrap();
        assert_eq!(claims.sub, admin.id);
        assert_eq!(claims.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_setup_refused_once_admin_exists() {
        let service = service().await;
        service.setup_admin(Credentials::new("owner", "hunter22")).await.unwrap();

        let err = service
            .setup_admin(Credentials::new("other", "hunter22"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_look_alike() {
        let service = service().await;
        service.create_staff(Credentials::new("cashier", "secret1")).await.unwrap();

        let wrong = service.login(Credentials::new("cashier", "nope")).await.unwrap_err();
        let unknown = service.login(Credentials::new("ghost", "secret1")).await.unwrap_err();
        assert_eq!(wrong.code, ErrorCode::Unauthorized);
        assert_eq!(wrong.message, unknown.message);
    }

    #[tokio::test]
    async fn test_admin_limited_to_one_session_until_logout() {
        let service = service().await;
        service.setup_admin(Credentials::new("owner", "hunter22")).await.unwrap();

        let first = service.login(Credentials::new("owner", "hunter22")).await.unwrap();
        let err = service
            .login(Credentials::new("owner", "hunter22"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
        assert_eq!(
            err.message,
            "Login limit reached. Only 1 concurrent login allowed. Currently 1 active session."
        );

        let caller = AuthUser::from(service.jwt.validate_token(&first.token).unwrap());
        service.logout(&caller);
        assert!(service.login(Credentials::new("owner", "hunter22")).await.is_ok());
    }

    #[tokio::test]
    async fn test_staff_limit_from_config() {
        let service = service_with(ApiConfig {
            staff_max_sessions: 2,
            ..ApiConfig::default()
        })
        .await;
        service.create_staff(Credentials::new("cashier", "secret1")).await.unwrap();

        for _ in 0..2 {
            service.login(Credentials::new("cashier", "secret1")).await.unwrap();
        }
        let err = service
            .login(Credentials::new("cashier", "secret1"))
            .await
            .unwrap_err();
        assert!(err.message.contains("Only 2 concurrent logins allowed"));
    }

    #[tokio::test]
    async fn test_create_admin_requires_admin_once_one_exists() {
        let service = service().await;
        let first = service
            .create_admin(Credentials::new("owner", "hunter22"), None)
            .await
            .unwrap();

        let err = service
            .create_admin(Credentials::new("second", "hunter22"), None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);

        let staff = AuthUser {
            id: "cashier".into(),
            role: Role::Staff,
            session_id: None,
        };
        let err = service
            .create_admin(Credentials::new("second", "hunter22"), Some(&staff))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let admin = AuthUser {
            id: first.id,
            role: Role::Admin,
            session_id: None,
        };
        let second = service
            .create_admin(Credentials::new("second", "hunter22"), Some(&admin))
            .await
            .unwrap();
        assert_eq!(second.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_account_rules() {
        let service = service().await;
        let err = service
            .create_staff(Credentials::new("cashier", "12345"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        service.create_staff(Credentials::new("cashier", "123456")).await.unwrap();
        let err = service
            .create_staff(Credentials::new("cashier", "123456"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.message, "Username already exists");
    }

    #[test]
    fn test_login_limit_message_plurals() {
        assert_eq!(
            login_limit_message(5, 5),
            "Login limit reached. Only 5 concurrent logins allowed. Currently 5 active sessions."
        );
    }
}
