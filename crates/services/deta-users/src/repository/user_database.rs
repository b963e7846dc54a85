//! User database backed by two Deta Bases: users and OAuth accounts.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::try_join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use common::{AppError, AppResult, DetaConfig, OAuthSyncPolicy, OptionExt};
use deta_base::{Base, Deta, Query};
use domain::{
    normalize_email, OAuthAccount, User, FIELD_ACCOUNT_ID, FIELD_EMAIL, FIELD_OAUTH_NAME,
    FIELD_USER_ID,
};

use super::documents::{item_key, item_to_user, item_user_id, oauth_account_to_item, user_to_item};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User database interface expected by the authentication layer.
///
/// Email lookups are case-insensitive: emails are stored lower-cased.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserDatabase: Send + Sync {
    /// Find user by ID
    async fn get(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find user by email address. The first match wins if several users share it.
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Find the user owning an OAuth account.
    ///
    /// Fails with `AppError::NotFound` if no account matches, or if the
    /// account exists but its user does not.
    async fn get_by_oauth_account(&self, oauth_name: &str, account_id: &str) -> AppResult<User>;

    /// Create a new user and store its OAuth accounts
    async fn create(&self, user: User) -> AppResult<User>;

    /// Overwrite a user and store its OAuth accounts
    async fn update(&self, user: User) -> AppResult<User>;

    /// Delete a user and every OAuth account it owns
    async fn delete(&self, user: &User) -> AppResult<()>;
}

/// Concrete implementation of UserDatabase over Deta Base.
///
/// Nothing here is transactional or atomic: the email check in `create`
/// races with concurrent creates, and a failure inside `delete` can leave
/// orphaned OAuth accounts behind.
pub struct DetaUserDatabase {
    users: Arc<dyn Base>,
    oauth_accounts: Arc<dyn Base>,
    sync_policy: OAuthSyncPolicy,
}

impl DetaUserDatabase {
    /// Create new adapter over a user Base and an OAuth account Base
    pub fn new(users: Arc<dyn Base>, oauth_accounts: Arc<dyn Base>) -> Self {
        Self {
            users,
            oauth_accounts,
            sync_policy: OAuthSyncPolicy::default(),
        }
    }

    /// Connect both Bases described by the configuration.
    pub fn from_config(config: &DetaConfig) -> AppResult<Self> {
        if config.project_key.is_empty() {
            return Err(AppError::validation("DETA_PROJECT_KEY must be set"));
        }

        let deta = Deta::with_options(
            config.project_key.as_str(),
            config.host.as_str(),
            Duration::from_millis(config.timeout_ms),
        )?;
        let users = deta.base(&config.user_base)?;
        let oauth_accounts = deta.base(&config.oauth_account_base)?;

        info!(
            "Using Deta Bases {} and {} in project {}",
            config.user_base,
            config.oauth_account_base,
            deta.project_id()
        );

        Ok(Self::new(Arc::new(users), Arc::new(oauth_accounts))
            .with_sync_policy(config.oauth_sync_policy))
    }

    pub fn with_sync_policy(mut self, sync_policy: OAuthSyncPolicy) -> Self {
        self.sync_policy = sync_policy;
        self
    }

    pub fn sync_policy(&self) -> OAuthSyncPolicy {
        self.sync_policy
    }

    /// Keys of every OAuth account document owned by the user
    async fn owned_oauth_account_keys(&self, user_id: &str) -> AppResult<Vec<String>> {
        let items = self
            .oauth_accounts
            .fetch(Query::new().eq(FIELD_USER_ID, user_id))
            .await?;

        Ok(items.iter().filter_map(item_key).collect())
    }

    /// Write each account onto the document already holding its
    /// (oauth_name, account_id) pair, or under the account's own id.
    async fn sync_oauth_accounts(&self, user_id: &str, accounts: &[OAuthAccount]) -> AppResult<()> {
        if accounts.is_empty() {
            return Ok(());
        }

        let mut synced = HashSet::with_capacity(accounts.len());
        for account in accounts {
            let existing = self
                .oauth_accounts
                .fetch(
                    Query::new()
                        .eq(FIELD_OAUTH_NAME, account.oauth_name.as_str())
                        .eq(FIELD_ACCOUNT_ID, account.account_id.as_str()),
                )
                .await?;

            let key = existing
                .first()
                .and_then(item_key)
                .unwrap_or_else(|| account.id.to_string());

            debug!(user_id = %user_id, oauth_name = %account.oauth_name, key = %key, "Syncing OAuth account");
            self.oauth_accounts
                .put(&key, oauth_account_to_item(user_id, account)?)
                .await?;
            synced.insert(key);
        }

        if self.sync_policy == OAuthSyncPolicy::Reconcile {
            for key in self.owned_oauth_account_keys(user_id).await? {
                if !synced.contains(&key) {
                    info!(user_id = %user_id, key = %key, "Removing unlinked OAuth account");
                    self.oauth_accounts.delete(&key).await?;
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl UserDatabase for DetaUserDatabase {
    async fn get(&self, id: Uuid) -> AppResult<Option<User>> {
        self.users
            .get(&id.to_string())
            .await?
            .map(item_to_user)
            .transpose()
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let items = self
            .users
            .fetch(Query::new().eq(FIELD_EMAIL, normalize_email(email)))
            .await?;

        items.into_iter().next().map(item_to_user).transpose()
    }

    async fn get_by_oauth_account(
        &self,
        oauth_name: &str,
        account_id: &str,
    ) -> AppResult<User> {
        let accounts = self
            .oauth_accounts
            .fetch(
                Query::new()
                    .eq(FIELD_OAUTH_NAME, oauth_name)
                    .eq(FIELD_ACCOUNT_ID, account_id),
            )
            .await?;

        let account = accounts.into_iter().next().ok_or_not_found()?;

        let user_id = item_user_id(&account).ok_or_not_found()?;
        match self.users.get(&user_id).await? {
            Some(item) => item_to_user(item),
            None => {
                warn!(user_id = %user_id, oauth_name = %oauth_name, "OAuth account points at a missing user");
                Err(AppError::NotFound)
            }
        }
    }

    async fn create(&self, mut user: User) -> AppResult<User> {
        user.normalize();

        // Check-then-insert: not atomic against concurrent creates
        if self.get_by_email(&user.email).await?.is_some() {
            return Err(AppError::conflict("User"));
        }

        let key = user.key();
        self.users.insert(&key, user_to_item(&user)?).await?;
        self.sync_oauth_accounts(&key, &user.oauth_accounts).await?;

        info!(user_id = %key, "User created");
        Ok(user)
    }

    async fn update(&self, mut user: User) -> AppResult<User> {
        user.normalize();

        let key = user.key();
        self.users.put(&key, user_to_item(&user)?).await?;
        self.sync_oauth_accounts(&key, &user.oauth_accounts).await?;

        debug!(user_id = %key, "User updated");
        Ok(user)
    }

    async fn delete(&self, user: &User) -> AppResult<()> {
        let key = user.key();

        let account_keys = self.owned_oauth_account_keys(&key).await?;
        try_join_all(account_keys.iter().map(|k| self.oauth_accounts.delete(k))).await?;

        self.users.delete(&key).await?;

        info!(user_id = %key, oauth_accounts = account_keys.len(), "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deta_base::{with_key, Item, MockBase, StoreError};
    use serde_json::{json, Value};
    use tokio_test::assert_ok;

    fn object(value: Value) -> Item {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn stored_user(user: &User) -> Item {
        with_key(&user.key(), user_to_item(user).unwrap())
    }

    fn adapter(users: MockBase, oauth_accounts: MockBase) -> DetaUserDatabase {
        DetaUserDatabase::new(Arc::new(users), Arc::new(oauth_accounts))
    }

    #[tokio::test]
    async fn test_get_uses_id_as_key() {
        let user = User::new("a@example.com", "h");
        let expected_key = user.key();
        let item = stored_user(&user);

        let mut users = MockBase::new();
        users
            .expect_get()
            .withf(move |key| key == expected_key.as_str())
            .times(1)
            .returning(move |_| Ok(Some(item.clone())));

        let found = adapter(users, MockBase::new()).get(user.id).await.unwrap();
        assert_eq!(found, Some(user));
    }

    #[tokio::test]
    async fn test_get_by_email_queries_lowercased_email() {
        let mut users = MockBase::new();
        users
            .expect_fetch()
            .withf(|query| query.get("email") == Some(&json!("mixed@example.com")))
            .times(1)
            .returning(|_| Ok(vec![]));

        let found = adapter(users, MockBase::new())
            .get_by_email("Mixed@Example.com")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_oauth_lookup_without_account_is_not_found() {
        let mut users = MockBase::new();
        users.expect_get().never();

        let mut oauth = MockBase::new();
        oauth
            .expect_fetch()
            .withf(|query| {
                query.get("oauth_name") == Some(&json!("google"))
                    && query.get("account_id") == Some(&json!("g-1"))
            })
            .returning(|_| Ok(vec![]));

        let result = adapter(users, oauth)
            .get_by_oauth_account("google", "g-1")
            .await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_oauth_lookup_with_missing_user_is_not_found() {
        let mut users = MockBase::new();
        users
            .expect_get()
            .withf(|key| key == "ghost")
            .returning(|_| Ok(None));

        let mut oauth = MockBase::new();
        oauth.expect_fetch().returning(|_| {
            Ok(vec![object(json!({
                "key": "acc-1",
                "oauth_name": "google",
                "account_id": "g-1",
                "user_id": "ghost",
            }))])
        });

        let result = adapter(users, oauth).get_by_oauth_account("google", "g-1").await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_create_with_taken_email_does_not_insert() {
        let existing = User::new("taken@example.com", "h");
        let item = stored_user(&existing);

        let mut users = MockBase::new();
        users
            .expect_fetch()
            .returning(move |_| Ok(vec![item.clone()]));
        users.expect_insert().never();

        let result = adapter(users, MockBase::new())
            .create(User::new("TAKEN@example.com", "h2"))
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_without_accounts_never_touches_oauth_base() {
        let mut users = MockBase::new();
        users.expect_fetch().returning(|_| Ok(vec![]));
        users
            .expect_insert()
            .times(1)
            .returning(|key, item| Ok(with_key(key, item)));

        // Any call on an unconfigured mock panics
        let created = assert_ok!(
            adapter(users, MockBase::new())
                .create(User::new("New@Example.com", "h"))
                .await
        );
        assert_eq!(created.email, "new@example.com");
    }

    #[tokio::test]
    async fn test_store_errors_propagate_unmodified() {
        let mut users = MockBase::new();
        users.expect_get().returning(|_| {
            Err(StoreError::Api {
                status: 503,
                errors: vec!["unavailable".to_string()],
            })
        });

        let result = adapter(users, MockBase::new()).get(Uuid::new_v4()).await;
        assert!(matches!(
            result,
            Err(AppError::Store(StoreError::Api { status: 503, .. }))
        ));
    }

    #[tokio::test]
    async fn test_sync_reuses_key_of_existing_account() {
        let user = User::new("a@example.com", "h")
            .with_oauth_account(OAuthAccount::new("google", "g-1", "a@gmail.com", "fresh-token"));
        let user_key = user.key();

        let mut oauth = MockBase::new();
        oauth.expect_fetch().returning(|_| {
            Ok(vec![object(json!({
                "key": "existing-key",
                "oauth_name": "google",
                "account_id": "g-1",
                "user_id": "someone",
            }))])
        });
        oauth
            .expect_put()
            .withf(move |key, item| {
                key == "existing-key"
                    && item["user_id"] == json!(user_key)
                    && item["access_token"] == json!("fresh-token")
            })
            .times(1)
            .returning(|key, item| Ok(with_key(key, item)));

        let mut users = MockBase::new();
        users.expect_put().returning(|key, item| Ok(with_key(key, item)));

        assert_ok!(adapter(users, oauth).update(user).await);
    }

    #[tokio::test]
    async fn test_delete_removes_accounts_before_user() {
        let user = User::new("a@example.com", "h");
        let user_key = user.key();
        let mut seq = mockall::Sequence::new();

        let mut oauth = MockBase::new();
        let owner = user_key.clone();
        oauth
            .expect_fetch()
            .withf(move |query| query.get("user_id") == Some(&json!(owner)))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![object(json!({"key": "acc-1", "user_id": "x"}))]));
        oauth
            .expect_delete()
            .withf(|key| key == "acc-1")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let mut users = MockBase::new();
        users
            .expect_delete()
            .withf(move |key| key == user_key.as_str())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        assert_ok!(adapter(users, oauth).delete(&user).await);
    }

    #[test]
    fn test_from_config_requires_project_key() {
        let result = DetaUserDatabase::from_config(&DetaConfig::default());
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_from_config_applies_sync_policy() {
        let config = DetaConfig {
            project_key: "proj_secret".to_string(),
            oauth_sync_policy: OAuthSyncPolicy::Reconcile,
            ..Default::default()
        };

        let db = DetaUserDatabase::from_config(&config).unwrap();
        assert_eq!(db.sync_policy(), OAuthSyncPolicy::Reconcile);
    }
}
