//! In-memory facades for tests
//!
//! Canned query results and a mail transport that remembers what it sent,
//! so probe logic can be exercised without a database or an MTA.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::mail::{MailMessage, MailTransport};
use super::query::QueryExecutor;
use crate::models::Table;
use crate::utils::{MailError, QueryError};

/// Query executor returning a fixed table (or a fixed error)
pub struct MockQueryExecutor {
    outcome: Result<Table, String>,
    calls: AtomicUsize,
    last_sql: Mutex<Option<String>>,
}

impl MockQueryExecutor {
    pub fn with_rows(table: Table) -> Self {
        Self {
            outcome: Ok(table),
            calls: AtomicUsize::new(0),
            last_sql: Mutex::new(None),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            last_sql: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_sql(&self) -> Option<String> {
        self.last_sql.lock().ok().and_then(|sql| sql.clone())
    }
}

#[async_trait]
impl QueryExecutor for MockQueryExecutor {
    fn source_name(&self) -> &str {
        "mock-db"
    }

    async fn query(&self, sql: &str) -> Result<Table, QueryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_sql.lock() {
            *last = Some(sql.to_string());
        }
        self.outcome
            .clone()
            .map_err(QueryError::Execution)
    }
}

/// Mail transport that records messages instead of delivering them
#[derive(Default)]
pub struct MockMailTransport {
    sent: Mutex<Vec<MailMessage>>,
    failure: Option<String>,
}

impl MockMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failure: Some(message.to_string()),
        }
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl MailTransport for MockMailTransport {
    fn name(&self) -> &str {
        "mock-mail"
    }

    async fn send(&self, message: &MailMessage) -> Result<String, MailError> {
        if let Some(reason) = &self.failure {
            return Err(MailError::Transport(reason.clone()));
        }
        message.validate()?;
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| MailError::Transport("mock poisoned".to_string()))?;
        sent.push(message.clone());
        Ok(format!("mock-{}", sent.len()))
    }
}
