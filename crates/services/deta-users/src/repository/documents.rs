//! Conversion between domain records and store documents.

use serde_json::{Map, Value};

use common::{AppError, AppResult};
use deta_base::Item;
use domain::{OAuthAccount, User, FIELD_KEY, FIELD_OAUTH_ACCOUNTS, FIELD_USER_ID};

fn into_item(value: Value) -> AppResult<Item> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(AppError::internal(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

/// User document: every field except the OAuth accounts, which live in their own Base.
///
/// Extra fields never shadow a modeled field, so the stored `id` and
/// normalized `email` always come from the struct.
pub(crate) fn user_to_item(user: &User) -> AppResult<Item> {
    let modeled = User {
        oauth_accounts: Vec::new(),
        extra: Map::new(),
        ..user.clone()
    };
    let mut item = into_item(serde_json::to_value(modeled)?)?;
    item.remove(FIELD_OAUTH_ACCOUNTS);

    for (field, value) in &user.extra {
        if field == FIELD_KEY || field == FIELD_OAUTH_ACCOUNTS {
            continue;
        }
        item.entry(field.clone()).or_insert_with(|| value.clone());
    }
    Ok(item)
}

pub(crate) fn item_to_user(mut item: Item) -> AppResult<User> {
    item.remove(FIELD_KEY);
    Ok(serde_json::from_value(Value::Object(item))?)
}

/// OAuth account document, tagged with its owner.
pub(crate) fn oauth_account_to_item(user_id: &str, account: &OAuthAccount) -> AppResult<Item> {
    let mut item = into_item(serde_json::to_value(account)?)?;
    item.insert(FIELD_USER_ID.to_string(), Value::String(user_id.to_string()));
    Ok(item)
}

pub(crate) fn item_key(item: &Item) -> Option<String> {
    string_field(item, FIELD_KEY)
}

pub(crate) fn item_user_id(item: &Item) -> Option<String> {
    string_field(item, FIELD_USER_ID)
}

fn string_field(item: &Item, field: &str) -> Option<String> {
    item.get(field).and_then(Value::as_str).map(str::to_string)
}
