//! In-memory executor for tests
//!
//! Records every statement, replays scripted result sets in FIFO order and
//! buffers transactional statements until commit.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use crate::error::{OrmError, OrmResult};
use super::core::*;

/// One statement as it reached the executor
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatement {
    pub sql: String,
    pub params: Vec<DatabaseValue>,
}

#[derive(Debug, Default)]
struct MemoryState {
    committed: Vec<RecordedStatement>,
    responses: VecDeque<Vec<ValueRow>>,
    fail_when: Option<String>,
    begun: usize,
    commits: usize,
    rollbacks: usize,
}

impl MemoryState {
    fn run(&mut self, sql: &str) -> OrmResult<Vec<ValueRow>> {
        if let Some(pattern) = &self.fail_when {
            if sql.contains(pattern.as_str()) {
                return Err(OrmError::Database(format!("forced failure on: {}", sql)));
            }
        }
        Ok(self.responses.pop_front().unwrap_or_default())
    }
}

/// Shared in-memory database handle
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the rows returned by the next fetched statement
    pub fn push_response(&self, rows: Vec<ValueRow>) {
        self.state.lock().unwrap().responses.push_back(rows);
    }

    /// Fail every statement whose SQL contains `pattern`
    pub fn fail_when(&self, pattern: &str) {
        self.state.lock().unwrap().fail_when = Some(pattern.to_string());
    }

    /// Statements that are durably visible (auto-committed or committed)
    pub fn committed(&self) -> Vec<RecordedStatement> {
        self.state.lock().unwrap().committed.clone()
    }

    pub fn transactions_begun(&self) -> usize {
        self.state.lock().unwrap().begun
    }

    pub fn commits(&self) -> usize {
        self.state.lock().unwrap().commits
    }

    pub fn rollbacks(&self) -> usize {
        self.state.lock().unwrap().rollbacks
    }

    fn record(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<ValueRow>> {
        let mut state = self.state.lock().unwrap();
        let rows = state.run(sql)?;
        state.committed.push(RecordedStatement {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        Ok(rows)
    }
}

fn boxed(rows: Vec<ValueRow>) -> Vec<Box<dyn DatabaseRow>> {
    rows.into_iter().map(|row| Box::new(row) as Box<dyn DatabaseRow>).collect()
}

#[async_trait]
impl DatabaseExecutor for MemoryDatabase {
    async fn execute(&mut self, sql: &str, params: &[DatabaseValue]) -> OrmResult<u64> {
        self.record(sql, params)?;
        Ok(1)
    }

    async fn fetch_all(&mut self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<Box<dyn DatabaseRow>>> {
        Ok(boxed(self.record(sql, params)?))
    }
}

#[async_trait]
impl DatabasePool for MemoryDatabase {
    async fn acquire(&self) -> OrmResult<Box<dyn DatabaseExecutor>> {
        Ok(Box::new(self.clone()))
    }

    async fn begin_transaction(&self) -> OrmResult<Box<dyn DatabaseTransaction>> {
        self.state.lock().unwrap().begun += 1;
        Ok(Box::new(MemoryTransaction {
            db: self.clone(),
            pending: Vec::new(),
        }))
    }
}

/// Transaction whose statements become visible only on commit
pub struct MemoryTransaction {
    db: MemoryDatabase,
    pending: Vec<RecordedStatement>,
}

impl MemoryTransaction {
    fn record(&mut self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<ValueRow>> {
        let rows = self.db.state.lock().unwrap().run(sql)?;
        self.pending.push(RecordedStatement {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        Ok(rows)
    }
}

#[async_trait]
impl DatabaseExecutor for MemoryTransaction {
    async fn execute(&mut self, sql: &str, params: &[DatabaseValue]) -> OrmResult<u64> {
        self.record(sql, params)?;
        Ok(1)
    }

    async fn fetch_all(&mut self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<Box<dyn DatabaseRow>>> {
        Ok(boxed(self.record(sql, params)?))
    }
}

#[async_trait]
impl DatabaseTransaction for MemoryTransaction {
    fn as_executor(&mut self) -> &mut dyn DatabaseExecutor {
        self
    }

    async fn commit(self: Box<Self>) -> OrmResult<()> {
        let MemoryTransaction { db, pending } = *self;
        let mut state = db.state.lock().unwrap();
        state.commits += 1;
        state.committed.extend(pending);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> OrmResult<()> {
        self.db.state.lock().unwrap().rollbacks += 1;
        Ok(())
    }
}
