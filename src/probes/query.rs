//! Query probe: runs one statement through the query facade
//!
//! Keys (under `<id>.`):
//! - `sql` (required)
//! - `min_rows`: fail when fewer rows come back
//! - `warn_ms` (default 1000): slower queries get a WARN entry

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::constants::QUERY_WARN_MS;
use crate::core::{BaseProbe, Probe, RunContext};
use crate::facade::QueryExecutor;
use crate::format::TableFormatter;
use crate::models::Entry;
use crate::utils::{ConfigError, ProbeError};

pub struct QueryProbe {
    base: BaseProbe,
    executor: Arc<dyn QueryExecutor>,
    sql: String,
    min_rows: Option<usize>,
    warn_after: Duration,
}

impl QueryProbe {
    pub fn new(id: &str, executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            base: BaseProbe::new(id),
            executor,
            sql: String::new(),
            min_rows: None,
            warn_after: Duration::from_millis(QUERY_WARN_MS),
        }
    }
}

#[async_trait]
impl Probe for QueryProbe {
    fn base(&self) -> &BaseProbe {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseProbe {
        &mut self.base
    }

    fn configure(&mut self, settings: &Settings) -> Result<(), ConfigError> {
        self.base.configure(settings)?;
        let scoped = self.base.scoped(settings);

        let sql = scoped.require("sql")?.to_string();
        let min_rows = scoped
            .get_u64("min_rows")?
            .map(|n| usize::try_from(n).unwrap_or(usize::MAX));
        let warn_after = Duration::from_millis(scoped.get_u64("warn_ms")?.unwrap_or(QUERY_WARN_MS));

        self.sql = sql;
        self.min_rows = min_rows;
        self.warn_after = warn_after;
        Ok(())
    }

    async fn execute(&mut self, _ctx: &RunContext) -> Result<(), ProbeError> {
        let source = self.executor.source_name().to_string();
        self.base.detail(format!("Running on {}: {}", source, self.sql));

        let started = Instant::now();
        let table = match self.executor.query(&self.sql).await {
            Ok(table) => table,
            Err(err) => {
                self.base
                    .error_with_cause(format!("Query on {} failed", source), &err);
                return Err(err.into());
            }
        };
        let elapsed = started.elapsed();
        let rows = table.row_count();

        self.base.info(format!(
            "{} row(s) from {} in {} ms",
            rows,
            source,
            elapsed.as_millis()
        ));
        if elapsed > self.warn_after {
            self.base.warn(format!(
                "Query took {} ms, above the {} ms threshold",
                elapsed.as_millis(),
                self.warn_after.as_millis()
            ));
        }
        self.base
            .log_with(Entry::info(table), Arc::new(TableFormatter));

        match self.min_rows {
            Some(min) if rows < min => {
                let message = format!("Expected at least {} row(s), got {}", min, rows);
                self.base.error(message.clone());
                Err(ProbeError::Check(message))
            }
            _ => Ok(()),
        }
    }
}
