use std::collections::BTreeMap;
use std::collections::HashMap;

use async_trait::async_trait;
use session_auth::Credential;
use session_auth::StoreError;
use session_auth::UserKey;
use session_auth::UserStore;
use tokio::sync::RwLock;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::User;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

/// Process-local user storage.
///
/// Keys are assigned from a counter starting at 1 and never reused.
pub struct InMemoryUserRepository {
    state: RwLock<State>,
}

struct State {
    users: BTreeMap<UserKey, User>,
    keys_by_email: HashMap<String, UserKey>,
    next_key: i64,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                users: BTreeMap::new(),
                keys_by_email: HashMap::new(),
                next_key: 1,
            }),
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, UserError> {
        let mut state = self.state.write().await;

        if state.keys_by_email.contains_key(user.email.as_str()) {
            return Err(UserError::EmailAlreadyExists(user.email.to_string()));
        }

        let id = UserKey(state.next_key);
        state.next_key = state
            .next_key
            .checked_add(1)
            .ok_or_else(|| UserError::DatabaseError("User key space exhausted".to_string()))?;

        let user = User {
            id,
            name: user.name,
            email: user.email,
            password_digest: user.password_digest,
            created_at: user.created_at,
        };
        state
            .keys_by_email
            .insert(user.email.as_str().to_string(), id);
        state.users.insert(id, user.clone());

        Ok(user)
    }

    async fn find_by_id(&self, id: &UserKey) -> Result<Option<User>, UserError> {
        Ok(self.state.read().await.users.get(id).cloned())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError> {
        let state = self.state.read().await;
        Ok(state
            .keys_by_email
            .get(email.as_str())
            .and_then(|id| state.users.get(id))
            .cloned())
    }

    async fn update_password_digest(
        &self,
        id: &UserKey,
        password_digest: String,
    ) -> Result<(), UserError> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(id)
            .ok_or(UserError::NotFound(id.to_string()))?;
        user.password_digest = password_digest;
        Ok(())
    }

    async fn delete(&self, id: &UserKey) -> Result<(), UserError> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .remove(id)
            .ok_or(UserError::NotFound(id.to_string()))?;
        state.keys_by_email.remove(user.email.as_str());
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryUserRepository {
    async fn find_by_key(&self, key: UserKey) -> Result<Option<Credential>, StoreError> {
        Ok(self
            .find_by_id(&key)
            .await?
            .map(|user| Credential::new(user.id, user.password_digest)))
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<Credential>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .keys_by_email
            .get(login)
            .and_then(|id| state.users.get(id))
            .map(|user| Credential::new(user.id, user.password_digest.clone())))
    }
}
