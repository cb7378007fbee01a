use async_trait::async_trait;
use session_auth::AuthenticationResult;
use session_auth::UserKey;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::Registration;
use crate::domain::user::models::User;
use crate::user::errors::UserError;

/// Port for user domain service operations.
#[async_trait]
pub trait UserServicePort: Send + Sync + 'static {
    /// Register a new account and open its first session.
    ///
    /// # Arguments
    /// * `command` - Validated command containing name, email, and password
    ///
    /// # Returns
    /// Created user and a session token with the default lifetime
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `Password` - Password hashing failed
    /// * `DatabaseError` - Database operation failed
    async fn register(&self, command: RegisterUserCommand) -> Result<Registration, UserError>;

    /// Authenticate with email and password.
    ///
    /// # Returns
    /// Session token and the authenticated user key
    ///
    /// # Errors
    /// * `Authentication` - Unknown email, wrong password, or lookup failure
    async fn login(&self, email: &str, password: &str)
        -> Result<AuthenticationResult, UserError>;

    /// Retrieve user by key.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn get_user(&self, id: &UserKey) -> Result<User, UserError>;

    /// Replace the password digest after checking the current password.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `Authentication` - Current password does not match
    /// * `Password` - Password hashing failed
    async fn change_password(
        &self,
        id: &UserKey,
        current_password: &str,
        new_password: String,
    ) -> Result<(), UserError>;

    /// Delete an account together with its credential.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn delete_user(&self, id: &UserKey) -> Result<(), UserError>;
}

/// Persistence operations for user aggregate.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist new user to storage and assign its key.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, user: NewUser) -> Result<User, UserError>;

    /// Retrieve user by key.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    async fn find_by_id(&self, id: &UserKey) -> Result<Option<User>, UserError>;

    /// Retrieve user by email address.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError>;

    /// Replace the stored password digest.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn update_password_digest(
        &self,
        id: &UserKey,
        password_digest: String,
    ) -> Result<(), UserError>;

    /// Remove user from storage.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn delete(&self, id: &UserKey) -> Result<(), UserError>;
}
