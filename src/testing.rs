//! Scripted stand-in for a live connection.

use std::collections::VecDeque;

use crate::error::SeedError;
use crate::executor::{is_read_statement, QueryExecutor, QueryOutput, Row, SqlValue};
use crate::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Answers statements from a queue of scripted results; once the queue is
/// empty reads return no rows and writes affect one row.
#[derive(Default)]
pub struct FakeExecutor {
    pub executed: Vec<Executed>,
    responses: VecDeque<Result<QueryOutput>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, out: QueryOutput) -> Self {
        self.responses.push_back(Ok(out));
        self
    }

    pub fn fail(mut self, msg: &str) -> Self {
        self.responses
            .push_back(Err(SeedError::StringError(msg.to_string())));
        self
    }

    pub fn statements(&self) -> Vec<&str> {
        self.executed.iter().map(|e| e.sql.as_str()).collect()
    }
}

pub fn rows_of(column: &str, values: &[SqlValue]) -> QueryOutput {
    QueryOutput::Rows(
        values
            .iter()
            .map(|v| std::iter::once((column, v.clone())).collect::<Row>())
            .collect(),
    )
}

impl QueryExecutor for FakeExecutor {
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<QueryOutput> {
        self.executed.push(Executed {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        match self.responses.pop_front() {
            Some(r) => r,
            None if is_read_statement(sql) => Ok(QueryOutput::Rows(Vec::new())),
            None => Ok(QueryOutput::Affected(1)),
        }
    }
}
