use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use session_auth::AuthenticationResult;
use session_auth::CredentialGate;
use session_auth::UserKey;
use session_auth::UserStore;

use crate::domain::user::models::NewUser;
use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::Registration;
use crate::domain::user::models::User;
use crate::user::errors::UserError;
use crate::user::ports::UserRepository;
use crate::user::ports::UserServicePort;

/// Domain service implementation for account operations.
///
/// The repository doubles as the credential store behind the gate.
pub struct UserService<UR>
where
    UR: UserRepository + UserStore,
{
    repository: Arc<UR>,
    gate: Arc<CredentialGate<UR>>,
}

impl<UR> UserService<UR>
where
    UR: UserRepository + UserStore,
{
    /// Create a new user service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    /// * `gate` - Credential gate reading from the same repository
    pub fn new(repository: Arc<UR>, gate: Arc<CredentialGate<UR>>) -> Self {
        Self { repository, gate }
    }

    /// Run the KDF off the async workers.
    async fn hash_password(&self, password: String) -> Result<String, UserError> {
        let gate = Arc::clone(&self.gate);
        let digest = tokio::task::spawn_blocking(move || gate.hash_password(&password))
            .await
            .map_err(|e| UserError::Unknown(format!("Password hashing task failed: {}", e)))??;
        Ok(digest)
    }
}

#[async_trait]
impl<UR> UserServicePort for UserService<UR>
where
    UR: UserRepository + UserStore,
{
    async fn register(&self, command: RegisterUserCommand) -> Result<Registration, UserError> {
        // Checked before hashing; `create` still enforces uniqueness on races.
        if self.repository.find_by_email(&command.email).await?.is_some() {
            return Err(UserError::EmailAlreadyExists(command.email.to_string()));
        }

        let password_digest = self.hash_password(command.password).await?;

        let user = self
            .repository
            .create(NewUser {
                name: command.name,
                email: command.email,
                password_digest,
                created_at: Utc::now(),
            })
            .await?;

        let access_token = self
            .gate
            .issue_session_token(user.id, self.gate.token_ttl_seconds())?;

        tracing::info!(user_id = %user.id, "User registered");

        Ok(Registration { user, access_token })
    }

    async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticationResult, UserError> {
        self.gate
            .login(email, password)
            .await
            .map_err(UserError::from)
    }

    async fn get_user(&self, id: &UserKey) -> Result<User, UserError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id.to_string()))
    }

    async fn change_password(
        &self,
        id: &UserKey,
        current_password: &str,
        new_password: String,
    ) -> Result<(), UserError> {
        let user = self.get_user(id).await?;

        self.gate
            .authenticate(user.email.as_str(), current_password)
            .await?;

        let password_digest = self.hash_password(new_password).await?;
        self.repository
            .update_password_digest(id, password_digest)
            .await?;

        tracing::info!(user_id = %id, "Password changed");

        Ok(())
    }

    async fn delete_user(&self, id: &UserKey) -> Result<(), UserError> {
        self.repository.delete(id).await?;

        tracing::info!(user_id = %id, "User deleted");

        Ok(())
    }
}
