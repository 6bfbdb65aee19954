//! In-memory client for executor tests.

use crate::client::GenericClient;
use crate::error::{BindError, BindResult};
use std::sync::Mutex;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// Records every statement it receives and returns canned results.
#[derive(Default)]
pub(crate) struct Recorder {
    calls: Mutex<Vec<(String, usize)>>,
    fail: bool,
}

impl Recorder {
    pub(crate) const AFFECTED: u64 = 3;
    pub(crate) const FAILURE: &'static str = "recorder failure";

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// `(sql, param_count)` per call, in call order.
    pub(crate) fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> BindResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), params.len()));
        if self.fail {
            Err(BindError::Other(Self::FAILURE.to_string()))
        } else {
            Ok(())
        }
    }
}

impl GenericClient for Recorder {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> BindResult<Vec<Row>> {
        self.record(sql, params)?;
        Ok(Vec::new())
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> BindResult<u64> {
        self.record(sql, params)?;
        Ok(Self::AFFECTED)
    }
}
