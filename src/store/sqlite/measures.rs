//! `project_measures` reads and appends.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Row};
use tracing::trace;

use super::{placeholders, SqliteStore, PARTITION_SIZE};
use crate::error::{MeasureError, MeasureResult};
use crate::model::{MeasureFact, VARIATION_COUNT};
use crate::store::{AnalysisTarget, MeasureFilter, MeasureStorage, RowHandler};

const MEASURE_COLUMNS: &str = "component_uuid, analysis_uuid, metric_id, person_id, value, text_value, \
variation_value_1, variation_value_2, variation_value_3, variation_value_4, variation_value_5, \
alert_status, alert_text, description";

/// Build the statement reading one analysis target, restricted to
/// `component_uuids` when given.
pub(crate) fn select_sql(
    target: &AnalysisTarget,
    component_uuids: Option<&[String]>,
    filter: &MeasureFilter,
) -> (String, Vec<Value>) {
    let mut sql = format!("SELECT {MEASURE_COLUMNS} FROM project_measures WHERE analysis_uuid = ?");
    let mut values = vec![Value::Text(target.analysis_uuid.clone())];

    if let Some(uuids) = component_uuids {
        sql.push_str(&format!(" AND component_uuid IN ({})", placeholders(uuids.len())));
        values.extend(uuids.iter().cloned().map(Value::Text));
    }

    if let Some(metric_ids) = &filter.metric_ids {
        sql.push_str(&format!(" AND metric_id IN ({})", placeholders(metric_ids.len())));
        values.extend(metric_ids.iter().map(|id| Value::Integer(i64::from(*id))));
    }

    match filter.person_id {
        Some(person_id) => {
            sql.push_str(" AND person_id = ?");
            values.push(Value::Integer(person_id));
        }
        None => sql.push_str(" AND person_id IS NULL"),
    }

    (sql, values)
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<MeasureFact> {
    let mut variations = [None; VARIATION_COUNT];
    for (i, slot) in variations.iter_mut().enumerate() {
        *slot = row.get(6 + i)?;
    }

    Ok(MeasureFact {
        component_uuid: row.get(0)?,
        analysis_uuid: row.get(1)?,
        metric_id: row.get(2)?,
        person_id: row.get(3)?,
        value: row.get(4)?,
        text_value: row.get(5)?,
        variations,
        alert_status: row.get(11)?,
        alert_text: row.get(12)?,
        description: row.get(13)?,
    })
}

impl SqliteStore {
    fn stream_target(
        &self,
        target: &AnalysisTarget,
        component_uuids: Option<&[String]>,
        filter: &MeasureFilter,
        handler: &mut RowHandler<'_>,
    ) -> MeasureResult<()> {
        let (sql, values) = select_sql(target, component_uuids, filter);
        trace!(%sql, "selecting measures");

        let conn = self.conn()?;
        let _mark = self.mark_streaming()?;
        let mut stmt = conn.prepare_cached(&sql)?;
        let mut rows = stmt.query(params_from_iter(values.iter()))?;
        while let Some(row) = rows.next()? {
            handler(map_row(row)?)?;
        }
        Ok(())
    }
}

impl MeasureStorage for SqliteStore {
    fn select_measures(
        &self,
        filter: &MeasureFilter,
        handler: &mut RowHandler<'_>,
    ) -> MeasureResult<()> {
        if filter.matches_nothing() {
            return Ok(());
        }

        for target in &filter.targets {
            match &target.component_uuids {
                None => self.stream_target(target, None, filter, handler)?,
                Some(uuids) => {
                    for chunk in uuids.chunks(PARTITION_SIZE) {
                        self.stream_target(target, Some(chunk), filter, handler)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn insert_measure(&self, fact: &MeasureFact) -> MeasureResult<()> {
        let conn = self.conn()?;
        let [v1, v2, v3, v4, v5] = fact.variations;
        let result = conn.execute(
            &format!(
                "INSERT INTO project_measures ({MEASURE_COLUMNS}) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            ),
            params![
                fact.component_uuid,
                fact.analysis_uuid,
                fact.metric_id,
                fact.person_id,
                fact.value,
                fact.text_value,
                v1,
                v2,
                v3,
                v4,
                v5,
                fact.alert_status,
                fact.alert_text,
                fact.description,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Err(MeasureError::DuplicateKey {
                    component_uuid: fact.component_uuid.clone(),
                    analysis_uuid: fact.analysis_uuid.clone(),
                    metric_id: fact.metric_id,
                    person_id: fact.person_id,
                })
            }
            Err(err) => Err(err.into()),
        }
    }
}
