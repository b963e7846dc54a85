//! Operator commands run by the `deta-users` binary.

use uuid::Uuid;

use common::{AppError, AppResult, OptionExt};
use domain::{User, UserResponse};

use crate::repository::UserDatabase;

/// Input for `create_user`
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub hashed_password: String,
    pub is_superuser: bool,
    pub is_verified: bool,
}

/// Look a user up by id.
pub async fn get_user(db: &dyn UserDatabase, id: Uuid) -> AppResult<UserResponse> {
    db.get(id).await?.ok_or_not_found().map(UserResponse::from)
}

/// Look a user up by email.
pub async fn find_by_email(db: &dyn UserDatabase, email: &str) -> AppResult<UserResponse> {
    db.get_by_email(email)
        .await?
        .ok_or_not_found()
        .map(UserResponse::from)
}

/// Look up the user linked to an OAuth account.
pub async fn find_by_oauth_account(
    db: &dyn UserDatabase,
    oauth_name: &str,
    account_id: &str,
) -> AppResult<UserResponse> {
    db.get_by_oauth_account(oauth_name, account_id)
        .await
        .map(UserResponse::from)
}

/// Create a user from an already hashed password.
pub async fn create_user(db: &dyn UserDatabase, input: NewUser) -> AppResult<UserResponse> {
    if input.email.trim().is_empty() {
        return Err(AppError::validation("Email must not be empty"));
    }
    if input.hashed_password.is_empty() {
        return Err(AppError::validation("Password hash must not be empty"));
    }

    let mut user = User::new(input.email, input.hashed_password);
    user.is_superuser = input.is_superuser;
    user.is_verified = input.is_verified;

    db.create(user).await.map(UserResponse::from)
}

/// Delete a user and its OAuth accounts, returning what was deleted.
pub async fn delete_user(db: &dyn UserDatabase, id: Uuid) -> AppResult<UserResponse> {
    let user = db.get(id).await?.ok_or_not_found()?;
    db.delete(&user).await?;
    Ok(UserResponse::from(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockUserDatabase;
    use mockall::predicate::eq;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            hashed_password: "hashed".to_string(),
            is_superuser: false,
            is_verified: true,
        }
    }

    #[tokio::test]
    async fn test_get_user_success() {
        let user = User::new("a@example.com", "hashed");
        let id = user.id;

        let mut db = MockUserDatabase::new();
        db.expect_get()
            .with(eq(id))
            .returning(move |_| Ok(Some(user.clone())));

        let response = get_user(&db, id).await.unwrap();
        assert_eq!(response.id, id);
        assert_eq!(response.email, "a@example.com");
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let mut db = MockUserDatabase::new();
        db.expect_get().returning(|_| Ok(None));

        let result = get_user(&db, Uuid::new_v4()).await;
        assert!(matches!(result.unwrap_err(), AppError::NotFound));
    }

    #[tokio::test]
    async fn test_find_by_oauth_account_not_found() {
        let mut db = MockUserDatabase::new();
        db.expect_get_by_oauth_account()
            .withf(|name, account| name == "github" && account == "7")
            .returning(|_, _| Err(AppError::NotFound));

        let result = find_by_oauth_account(&db, "github", "7").await;
        assert!(matches!(result.unwrap_err(), AppError::NotFound));
    }

    #[tokio::test]
    async fn test_create_user_passes_flags() {
        let mut db = MockUserDatabase::new();
        db.expect_create()
            .withf(|user| user.email == "a@example.com" && user.is_verified && !user.is_superuser)
            .times(1)
            .returning(Ok);

        let response = create_user(&db, new_user("a@example.com")).await.unwrap();
        assert!(response.is_verified);
    }

    #[tokio::test]
    async fn test_create_user_rejects_blank_email() {
        let mut db = MockUserDatabase::new();
        db.expect_create().never();

        let result = create_user(&db, new_user("  ")).await;
        assert!(matches!(result.unwrap_err(), AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_user_deletes_fetched_record() {
        let user = User::new("a@example.com", "hashed");
        let id = user.id;
        let stored = user.clone();

        let mut db = MockUserDatabase::new();
        db.expect_get().returning(move |_| Ok(Some(stored.clone())));
        db.expect_delete()
            .withf(move |u| u.id == id)
            .times(1)
            .returning(|_| Ok(()));

        let response = delete_user(&db, id).await.unwrap();
        assert_eq!(response.id, id);
    }

    #[tokio::test]
    async fn test_delete_missing_user_is_not_found() {
        let mut db = MockUserDatabase::new();
        db.expect_get().returning(|_| Ok(None));
        db.expect_delete().never();

        let result = delete_user(&db, Uuid::new_v4()).await;
        assert!(matches!(result.unwrap_err(), AppError::NotFound));
    }
}
