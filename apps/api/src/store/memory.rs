//! In-memory backends for the `testing` environment and the test suite.
//!
//! `MemoryStore` mimics the hosted service's insert defaults (generated id,
//! created/updated timestamps) so rows parse into the same typed records.
//! `StaticTokenAuth` accepts exactly one bearer token and treats its holder
//! as an admin.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::{AuthError, AuthProvider, AuthSession, AuthUser};
use crate::store::{Op, Predicate, RowFilter, RowStore, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Value>>> {
        // A poisoned table map is still structurally valid.
        match self.tables.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn matches(row: &Value, predicate: &Predicate) -> bool {
    let Some(field) = row.get(&predicate.column) else {
        return false;
    };
    match predicate.op {
        Op::Eq => field == &predicate.value,
        Op::Lte => match (field.as_f64(), predicate.value.as_f64()) {
            (Some(have), Some(want)) => have <= want,
            _ => false,
        },
    }
}

fn matches_all(row: &Value, filter: &RowFilter) -> bool {
    filter.predicates.iter().all(|p| matches(row, p))
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn insert(&self, table: &str, record: Value) -> Result<Value, StoreError> {
        let mut record = record;
        if let Some(map) = record.as_object_mut() {
            let now = Value::String(Utc::now().to_rfc3339());
            map.entry("id")
                .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
            map.entry("created_at").or_insert_with(|| now.clone());
            map.entry("updated_at").or_insert(now);
        }
        self.lock()
            .entry(table.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn select(&self, table: &str, filter: &RowFilter) -> Result<Vec<Value>, StoreError> {
        let tables = self.lock();
        let rows = tables.get(table).map(Vec::as_slice).unwrap_or_default();
        let mut selected: Vec<Value> = rows
            .iter()
            .filter(|row| matches_all(row, filter))
            .cloned()
            .collect();
        if let Some(limit) = filter.limit {
            selected.truncate(limit);
        }
        Ok(selected)
    }

    async fn update(
        &self,
        table: &str,
        filter: &RowFilter,
        patch: Value,
    ) -> Result<Vec<Value>, StoreError> {
        let mut tables = self.lock();
        let rows = tables.entry(table.to_string()).or_default();
        let mut updated = Vec::new();
        for row in rows.iter_mut() {
            if !matches_all(row, filter) {
                continue;
            }
            if let (Some(target), Some(fields)) = (row.as_object_mut(), patch.as_object()) {
                for (key, value) in fields {
                    target.insert(key.clone(), value.clone());
                }
                target.insert(
                    "updated_at".to_string(),
                    Value::String(Utc::now().to_rfc3339()),
                );
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filter: &RowFilter) -> Result<u64, StoreError> {
        let mut tables = self.lock();
        let rows = tables.entry(table.to_string()).or_default();
        let before = rows.len();
        rows.retain(|row| !matches_all(row, filter));
        Ok((before - rows.len()) as u64)
    }
}

/// Auth backend for hermetic runs: one shared token, every holder is admin.
pub struct StaticTokenAuth {
    token: String,
}

impl StaticTokenAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    fn admin_user(email: &str, full_name: Option<&str>) -> AuthUser {
        AuthUser {
            id: Uuid::nil().to_string(),
            email: email.to_string(),
            full_name: full_name.map(str::to_string),
            role: Some("admin".to_string()),
        }
    }
}

#[async_trait]
impl AuthProvider for StaticTokenAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(AuthSession {
            user: Self::admin_user(email, None),
            access_token: self.token.clone(),
            token_type: "bearer".to_string(),
        })
    }

    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        full_name: Option<&str>,
    ) -> Result<AuthUser, AuthError> {
        Ok(Self::admin_user(email, full_name))
    }

    async fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        if token == self.token {
            Ok(Self::admin_user("admin@localhost", None))
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}
