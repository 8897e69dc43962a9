//! Snapshots and metric definitions.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension};
use tracing::info;

use super::{placeholders, SqliteStore, PARTITION_SIZE};
use crate::error::MeasureResult;
use crate::model::{Metric, Snapshot};
use crate::store::{AnalysisStore, MetricStore, StoreResult};

impl SqliteStore {
    /// Record an analysis.
    ///
    /// A snapshot flagged last takes the flag away from the previous last
    /// snapshot of the same component.
    pub fn insert_snapshot(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        if snapshot.last {
            let demoted = tx.execute(
                "UPDATE snapshots SET islast = 0 WHERE component_uuid = ? AND islast = 1 AND uuid <> ?",
                params![snapshot.component_uuid, snapshot.uuid],
            )?;
            if demoted > 0 {
                info!(
                    component = %snapshot.component_uuid,
                    analysis = %snapshot.uuid,
                    "promoted analysis to last"
                );
            }
        }

        tx.execute(
            "INSERT OR REPLACE INTO snapshots (uuid, component_uuid, islast, created_at) \
             VALUES (?, ?, ?, ?)",
            params![
                snapshot.uuid,
                snapshot.component_uuid,
                snapshot.last,
                snapshot.created_at
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Snapshots of a component, newest first.
    pub fn select_snapshots_of(&self, component_uuid: &str) -> StoreResult<Vec<Snapshot>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT uuid, component_uuid, islast, created_at FROM snapshots \
             WHERE component_uuid = ? ORDER BY created_at DESC, uuid",
        )?;
        let rows = stmt.query_map(params![component_uuid], |row| {
            Ok(Snapshot {
                uuid: row.get(0)?,
                component_uuid: row.get(1)?,
                last: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Insert or replace a metric definition.
    pub fn insert_metric(&self, metric: &Metric) -> StoreResult<()> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO metrics (id, key, name) VALUES (?, ?, ?)",
            params![metric.id, metric.key, metric.name],
        )?;
        Ok(())
    }
}

impl AnalysisStore for SqliteStore {
    fn select_last_analysis_uuid(&self, project_uuid: &str) -> MeasureResult<Option<String>> {
        let conn = self.conn()?;
        let uuid = conn
            .query_row(
                "SELECT uuid FROM snapshots WHERE component_uuid = ? AND islast = 1",
                params![project_uuid],
                |row| row.get(0),
            )
            .optional()?;
        Ok(uuid)
    }

    fn select_last_analysis_uuids(&self) -> MeasureResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare_cached("SELECT uuid FROM snapshots WHERE islast = 1 ORDER BY uuid")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<String>, _>>()?)
    }
}

impl MetricStore for SqliteStore {
    fn select_ids_by_keys(&self, keys: &[String]) -> MeasureResult<Vec<i32>> {
        let conn = self.conn()?;
        let mut ids = Vec::with_capacity(keys.len());
        for chunk in keys.chunks(PARTITION_SIZE) {
            let sql = format!(
                "SELECT id FROM metrics WHERE key IN ({}) ORDER BY id",
                placeholders(chunk.len())
            );
            let values: Vec<Value> = chunk.iter().cloned().map(Value::Text).collect();
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows = stmt.query_map(params_from_iter(values.iter()), |row| row.get(0))?;
            for id in rows {
                ids.push(id?);
            }
        }
        Ok(ids)
    }
}
