//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;

use keygate::models::credential::{CredentialRecord, NewCredentialRecord};
use keygate::models::principal::Principal;
use keygate::models::query::QueryRow;
use keygate::services::notifier::{NotificationSender, NotifyError};
use keygate::services::query_gateway::QueryLimits;
use keygate::state::AppState;
use keygate::store::{CredentialStore, RelationalStore, StoreError, UserDirectory};

#[derive(Default)]
pub struct MemoryCredentialStore {
    records: Mutex<Vec<CredentialRecord>>,
    next_id: AtomicUsize,
    pub fail_insert: AtomicBool,
    pub fail_lookup: AtomicBool,
    pub fail_touch: AtomicBool,
    pub inserts: AtomicUsize,
    pub touches: AtomicUsize,
}

impl MemoryCredentialStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn get(&self, id: i64) -> Option<CredentialRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn insert(
        &self,
        credential: NewCredentialRecord,
    ) -> Result<CredentialRecord, StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(StoreError::NotConfirmed);
        }

        let mut records = self.records.lock().unwrap();
        if records.iter().any(|r| r.secret_hash == credential.secret_hash) {
            return Err(StoreError::Unavailable(
                "duplicate key value violates unique constraint".to_string(),
            ));
        }

        let now = Utc::now();
        let record = CredentialRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1,
            secret_hash: credential.secret_hash,
            display_prefix: credential.display_prefix,
            label: credential.label,
            description: credential.description,
            issued_by: credential.issued_by,
            elevated: credential.elevated,
            active: true,
            expires_at: credential.expires_at,
            last_used_at: None,
            created_at: now,
            updated_at: now,
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn find_by_hash(
        &self,
        secret_hash: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        if self.fail_lookup.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }

        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.secret_hash == secret_hash)
            .cloned())
    }

    async fn list(&self, issued_by: Option<&str>) -> Result<Vec<CredentialRecord>, StoreError> {
        let mut records: Vec<_> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| issued_by.is_none() || r.issued_by.as_deref() == issued_by)
            .cloned()
            .collect();
        records.reverse();
        Ok(records)
    }

    async fn touch_last_used(&self, id: i64, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.touches.fetch_add(1, Ordering::SeqCst);
        if self.fail_touch.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("write timeout".to_string()));
        }

        let mut records = self.records.lock().unwrap();
        if let Some(record) = records.iter_mut().find(|r| r.id == id) {
            if record.last_used_at.is_none_or(|prev| prev < at) {
                record.last_used_at = Some(at);
            }
        }
        Ok(())
    }

    async fn deactivate(&self, id: i64) -> Result<bool, StoreError> {
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.active = false;
                record.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }
}

/// Relational store that returns scripted rows and records every statement.
#[derive(Default)]
pub struct ScriptedRelationalStore {
    rows: Mutex<Vec<QueryRow>>,
    error: Mutex<Option<String>>,
    pub unreachable: AtomicBool,
    pub statements: Mutex<Vec<String>>,
}

impl ScriptedRelationalStore {
    pub fn returning(count: usize) -> Arc<Self> {
        let store = Self::default();
        *store.rows.lock().unwrap() = numbered_rows(count);
        Arc::new(store)
    }

    pub fn failing(message: &str) -> Arc<Self> {
        let store = Self::default();
        *store.error.lock().unwrap() = Some(message.to_string());
        Arc::new(store)
    }

    /// Store whose health ping fails, as when the database is down.
    pub fn unreachable() -> Arc<Self> {
        let store = Self::default();
        store.unreachable.store(true, Ordering::SeqCst);
        Arc::new(store)
    }

    pub fn calls(&self) -> usize {
        self.statements.lock().unwrap().len()
    }

    pub fn last_statement(&self) -> Option<String> {
        self.statements.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl RelationalStore for ScriptedRelationalStore {
    async fn fetch_rows(&self, statement: &str) -> Result<Vec<QueryRow>, StoreError> {
        self.statements.lock().unwrap().push(statement.to_string());
        if let Some(message) = self.error.lock().unwrap().clone() {
            return Err(StoreError::Unavailable(message));
        }
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

pub fn numbered_rows(count: usize) -> Vec<QueryRow> {
    (0..count)
        .map(|i| {
            let mut row = QueryRow::new();
            row.insert("id".to_string(), json!(i));
            row.insert("name".to_string(), json!(format!("widget-{i}")));
            row
        })
        .collect()
}

#[derive(Default)]
pub struct StaticUserDirectory {
    users: Vec<Principal>,
    pub lookups: AtomicUsize,
}

impl StaticUserDirectory {
    pub fn with(users: &[(&str, bool)]) -> Arc<Self> {
        Arc::new(Self {
            users: users
                .iter()
                .map(|(username, disabled)| Principal {
                    username: username.to_string(),
                    disabled: *disabled,
                })
                .collect(),
            lookups: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn lookup(&self, identity: &str) -> Result<Option<Principal>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.users.iter().find(|u| u.username == identity).cloned())
    }
}

/// Notification sender that keeps every message.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn send(&self, address: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((address.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

pub struct Harness {
    pub credentials: Arc<MemoryCredentialStore>,
    pub relational: Arc<ScriptedRelationalStore>,
    pub users: Arc<StaticUserDirectory>,
    pub notifier: Arc<RecordingNotifier>,
    pub state: AppState,
}

pub fn harness(relational: Arc<ScriptedRelationalStore>, hard_cap: usize) -> Harness {
    let credentials = MemoryCredentialStore::new();
    let users = StaticUserDirectory::with(&[("alice", false), ("mallory", true)]);
    let notifier = Arc::new(RecordingNotifier::default());

    let state = AppState {
        credentials: credentials.clone(),
        relational: relational.clone(),
        users: users.clone(),
        notifier: Some(notifier.clone()),
        limits: QueryLimits { hard_cap },
        degraded: false,
    };

    Harness {
        credentials,
        relational,
        users,
        notifier,
        state,
    }
}

/// Let detached tasks run until `done` holds or the budget runs out.
pub async fn settle(mut done: impl FnMut() -> bool) {
    for _ in 0..200 {
        if done() {
            return;
        }
        tokio::task::yield_now().await;
    }
}
