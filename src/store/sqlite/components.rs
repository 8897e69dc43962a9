//! Component lookups and tree walks.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use tracing::trace;

use super::{escape_like, placeholders, SqliteStore, PARTITION_SIZE};
use crate::error::MeasureResult;
use crate::model::{Component, Qualifier, Scope};
use crate::query::{ComponentTreeQuery, Strategy};
use crate::store::{ComponentStore, StoreError, StoreResult};

const COMPONENT_COLUMNS: &str =
    "c.uuid, c.project_uuid, c.uuid_path, c.kee, c.name, c.scope, c.qualifier, c.enabled";

/// Build the statement selecting the nodes of `query` under `base`.
pub(crate) fn tree_sql(base: &Component, query: &ComponentTreeQuery) -> (String, Vec<Value>) {
    let mut sql = format!(
        "SELECT {COMPONENT_COLUMNS} FROM components c WHERE c.enabled = 1 AND c.project_uuid = ?"
    );
    let mut values = vec![
        Value::Text(base.project_uuid.clone()),
        Value::Text(base.uuid.clone()),
    ];

    match query.strategy() {
        Strategy::Children => {
            sql.push_str(" AND (c.uuid = ? OR c.uuid_path = ?)");
            values.push(Value::Text(base.child_uuid_path()));
        }
        Strategy::Leaves => {
            sql.push_str(
                " AND (c.uuid = ? OR (c.uuid_path LIKE ? ESCAPE '\\' AND NOT EXISTS (\
                 SELECT 1 FROM components ch WHERE ch.enabled = 1 \
                 AND ch.uuid_path = c.uuid_path || c.uuid || '.')))",
            );
            values.push(Value::Text(format!(
                "{}%",
                escape_like(&base.child_uuid_path())
            )));
        }
    }

    if let Some(qualifiers) = query.qualifiers() {
        sql.push_str(&format!(" AND c.qualifier IN ({})", placeholders(qualifiers.len())));
        values.extend(qualifiers.iter().map(|q| Value::Text(q.as_str().to_string())));
    }

    if let Some(text) = query.name_or_key_query() {
        let pattern = format!("%{}%", escape_like(&text.to_uppercase()));
        sql.push_str(
            " AND (UPPER(c.name) LIKE ? ESCAPE '\\' OR UPPER(c.kee) LIKE ? ESCAPE '\\')",
        );
        values.push(Value::Text(pattern.clone()));
        values.push(Value::Text(pattern));
    }

    sql.push_str(" ORDER BY c.uuid_path, c.name, c.uuid");

    if let Some(page) = query.pagination() {
        sql.push_str(" LIMIT ? OFFSET ?");
        values.push(Value::Integer(i64::try_from(page.page_size).unwrap_or(i64::MAX)));
        values.push(Value::Integer(i64::try_from(page.offset()).unwrap_or(i64::MAX)));
    }

    (sql, values)
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<StoreResult<Component>> {
    let scope: String = row.get(5)?;
    let qualifier: String = row.get(6)?;
    let uuid: String = row.get(0)?;

    let parsed = scope
        .parse::<Scope>()
        .and_then(|scope| qualifier.parse::<Qualifier>().map(|q| (scope, q)));
    let (scope, qualifier) = match parsed {
        Ok(pair) => pair,
        Err(err) => {
            return Ok(Err(StoreError::CorruptRow {
                table: "components",
                reason: format!("component {uuid}: {err}"),
            }))
        }
    };

    Ok(Ok(Component {
        uuid,
        project_uuid: row.get(1)?,
        uuid_path: row.get(2)?,
        key: row.get(3)?,
        name: row.get(4)?,
        scope,
        qualifier,
        enabled: row.get(7)?,
    }))
}

impl SqliteStore {
    /// Insert or replace a component.
    pub fn insert_component(&self, component: &Component) -> StoreResult<()> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO components \
             (uuid, project_uuid, uuid_path, kee, name, scope, qualifier, enabled) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                component.uuid,
                component.project_uuid,
                component.uuid_path,
                component.key,
                component.name,
                component.scope.as_str(),
                component.qualifier.as_str(),
                component.enabled,
            ],
        )?;
        Ok(())
    }

    fn query_components(&self, sql: &str, values: &[Value]) -> MeasureResult<Vec<Component>> {
        trace!(%sql, "selecting components");
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), map_row)?;

        let mut components = Vec::new();
        for row in rows {
            components.push(row??);
        }
        Ok(components)
    }
}

impl ComponentStore for SqliteStore {
    fn select_by_uuid(&self, uuid: &str) -> MeasureResult<Option<Component>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!("SELECT {COMPONENT_COLUMNS} FROM components c WHERE c.uuid = ?"),
                params![uuid],
                map_row,
            )
            .optional()?;
        Ok(row.transpose()?)
    }

    fn select_by_uuids(&self, uuids: &[String]) -> MeasureResult<Vec<Component>> {
        let mut components = Vec::with_capacity(uuids.len());
        for chunk in uuids.chunks(PARTITION_SIZE) {
            let sql = format!(
                "SELECT {COMPONENT_COLUMNS} FROM components c WHERE c.uuid IN ({})",
                placeholders(chunk.len())
            );
            let values: Vec<Value> = chunk.iter().cloned().map(Value::Text).collect();
            components.extend(self.query_components(&sql, &values)?);
        }
        Ok(components)
    }

    fn select_tree(
        &self,
        base: &Component,
        query: &ComponentTreeQuery,
    ) -> MeasureResult<Vec<Component>> {
        if query.returns_empty() {
            return Ok(Vec::new());
        }
        let (sql, values) = tree_sql(base, query);
        self.query_components(&sql, &values)
    }
}
