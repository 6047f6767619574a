//! Shared fixtures: example entities and a recording executor.

#![allow(dead_code)]

use entorm::{Entity, OrmResult, Row, StatementExecutor};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Entity)]
#[orm(table = "contact_phone")]
pub struct ContactPhone;

#[derive(Entity)]
pub struct StudlyCaps;

#[derive(Entity)]
#[orm(table = "my_table", column_prefix = "stn_")]
pub struct StaticTableName;

#[derive(Entity)]
#[orm(table = "psr0_studly_caps", auto_increment = false)]
pub struct Psr0StudlyCaps;

#[derive(Entity)]
#[orm(table = "memberships", primary_key = "user_id, group_id", auto_increment = false)]
pub struct Membership;

#[derive(Default)]
struct MockState {
    statements: Vec<String>,
    responses: VecDeque<Vec<Row>>,
}

/// Executor that records every statement and answers from a queue.
///
/// Each call pops the next queued response; an empty queue answers with no
/// rows.
#[derive(Clone, Default)]
pub struct MockExecutor {
    state: Arc<Mutex<MockState>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the rows returned by the next unanswered statement.
    pub fn respond(&self, rows: Vec<Row>) -> &Self {
        self.state.lock().unwrap().responses.push_back(rows);
        self
    }

    /// Queue an empty result.
    pub fn respond_empty(&self) -> &Self {
        self.respond(Vec::new())
    }

    /// Every statement executed so far.
    pub fn statements(&self) -> Vec<String> {
        self.state.lock().unwrap().statements.clone()
    }
}

impl StatementExecutor for MockExecutor {
    async fn execute(&self, sql: &str) -> OrmResult<Vec<Row>> {
        let mut state = self.state.lock().unwrap();
        state.statements.push(sql.to_string());
        Ok(state.responses.pop_front().unwrap_or_default())
    }
}

/// Build a text row the way the simple-query protocol returns it.
pub fn row(columns: &[(&str, &str)]) -> Row {
    columns.iter().map(|(k, v)| (*k, *v)).collect()
}
