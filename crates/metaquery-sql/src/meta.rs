//! Key/value meta store built on the query shapes.
//!
//! Entries are `(total_id, key, value)` rows. Lookups by id and key escape the
//! literal and anchor it with [`MatchKind::Full`], so they behave like
//! equality under `REGEXP`.
//!
//! Non-text values are stored as JSON text, which is what the typed readers
//! ([`MetaStore::get_value`], [`MetaStore::get_list`]) decode. Plain text
//! written with [`MetaStore::set_string`] reads back as a JSON string.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, info, instrument};

use crate::executor::{Row, StatementExecutor};
use crate::query::{
    delete, escape_pattern, insert, select, update, Column, CompiledQuery, MatchKind, Select,
};
use crate::table::{Table, TableMapping};
use crate::{MetaQueryError, MetaValue, Result};

/// SELECT of every logical column filtered on `column` matching `pattern`.
///
/// This is the statement [`MetaStore::find`] runs.
pub fn find_query(column: Column, pattern: &str, kind: MatchKind) -> Result<Select> {
    select(Column::ALL).where_match(column, pattern, kind)
}

/// Decodes stored text as `T`.
///
/// JSON is tried first; text that is not valid JSON for `T` is retried as a
/// JSON string so plain text reads back into `String`-like targets.
fn decode_stored<T: DeserializeOwned>(raw: String) -> Result<T> {
    match serde_json::from_str::<T>(&raw) {
        Ok(value) => Ok(value),
        Err(err) => serde_json::from_value::<T>(JsonValue::String(raw))
            .map_err(|_| MetaQueryError::from(err)),
    }
}

/// One stored entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaEntry {
    pub total_id: String,
    pub key: String,
    pub value: Option<String>,
}

/// Key/value store over a mapped table.
#[derive(Debug, Clone)]
pub struct MetaStore<E> {
    executor: E,
    table: TableMapping,
}

impl<E: StatementExecutor> MetaStore<E> {
    /// Creates a store. Every logical column must be mapped.
    pub fn new(executor: E, table: TableMapping) -> Result<Self> {
        for column in Column::ALL {
            table.resolve(column)?;
        }
        Ok(Self { executor, table })
    }

    pub fn table(&self) -> &TableMapping {
        &self.table
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Creates the backing table if it does not exist.
    ///
    /// Primary physical columns are `NOT NULL`; extra physical columns of a
    /// logical column are nullable.
    #[instrument(skip(self), fields(table = %self.table.table_name()))]
    pub async fn ensure_table(&self) -> Result<()> {
        let mut definitions: Vec<String> = Vec::new();
        let mut seen: Vec<&str> = Vec::new();
        for column in Column::ALL {
            for (index, name) in self.table.resolve(column)?.iter().enumerate() {
                if seen.contains(&name.as_str()) {
                    continue;
                }
                seen.push(name);
                let constraint = if index == 0 { " NOT NULL" } else { "" };
                definitions.push(format!("{} TEXT{}", name, constraint));
            }
        }

        let ddl = CompiledQuery {
            sql: format!(
                "CREATE TABLE IF NOT EXISTS {} ({});",
                self.table.table_name(),
                definitions.join(", ")
            ),
            params: Vec::new(),
            result_width: 0,
        };
        self.executor.execute(&ddl).await?;
        info!("Meta table ready");
        Ok(())
    }

    /// Reads the value stored under `key` for `total_id`.
    #[instrument(skip(self))]
    pub async fn get_string(&self, total_id: &str, key: &str) -> Result<Option<String>> {
        let rows = select([Column::Value])
            .where_match(Column::TotalId, &escape_pattern(total_id), MatchKind::Full)?
            .and_match(Column::Key, &escape_pattern(key), MatchKind::Full)?
            .execute(&self.table, &self.executor)
            .await?;

        Ok(rows.into_iter().next().and_then(|row| row.into_iter().next().flatten()))
    }

    /// Stores `value` under `key`; `None` removes the entry.
    pub async fn set_string(&self, total_id: &str, key: &str, value: Option<&str>) -> Result<()> {
        match value {
            Some(value) => self.set_value(total_id, key, value).await,
            None => self.delete(total_id, key).await.map(|_| ()),
        }
    }

    /// Stores any value under `key`; non-text values are stored as JSON text.
    ///
    /// Updates the existing entry and inserts one when nothing was updated.
    #[instrument(skip(self, value))]
    pub async fn set_value(&self, total_id: &str, key: &str, value: impl Into<MetaValue>) -> Result<()> {
        let value = value.into();
        let updated = update(Column::Value, value.clone())?
            .where_match(Column::TotalId, &escape_pattern(total_id), MatchKind::Full)?
            .and_match(Column::Key, &escape_pattern(key), MatchKind::Full)?
            .execute(&self.table, &self.executor)
            .await?;

        if updated == 0 {
            insert(Column::TotalId, total_id)?
                .value(Column::Key, key)?
                .value(Column::Value, value)?
                .execute(&self.table, &self.executor)
                .await?;
            debug!("Entry inserted");
        } else {
            debug!(updated = updated, "Entry updated");
        }
        Ok(())
    }

    /// Stores any serializable value as JSON text.
    pub async fn set_object<T: Serialize + ?Sized>(&self, total_id: &str, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_value(value)?;
        self.set_value(total_id, key, json).await
    }

    /// Reads the value under `key` decoded as `T`; `None` when there is no entry.
    ///
    /// # Errors
    ///
    /// [`MetaQueryError::Deserialization`] when the stored text is not a `T`.
    pub async fn get_value<T: DeserializeOwned>(&self, total_id: &str, key: &str) -> Result<Option<T>> {
        self.get_string(total_id, key)
            .await?
            .map(decode_stored)
            .transpose()
    }

    pub async fn get_i64(&self, total_id: &str, key: &str) -> Result<Option<i64>> {
        self.get_value(total_id, key).await
    }

    pub async fn get_f64(&self, total_id: &str, key: &str) -> Result<Option<f64>> {
        self.get_value(total_id, key).await
    }

    pub async fn get_bool(&self, total_id: &str, key: &str) -> Result<Option<bool>> {
        self.get_value(total_id, key).await
    }

    /// Whether an entry exists for `key`.
    #[instrument(skip(self))]
    pub async fn contains(&self, total_id: &str, key: &str) -> Result<bool> {
        let rows = select([Column::Key])
            .where_match(Column::TotalId, &escape_pattern(total_id), MatchKind::Full)?
            .and_match(Column::Key, &escape_pattern(key), MatchKind::Full)?
            .execute(&self.table, &self.executor)
            .await?;
        Ok(!rows.is_empty())
    }

    /// Stores a list as a JSON array; `None` removes the entry.
    pub async fn set_list<T: Serialize>(&self, total_id: &str, key: &str, values: Option<&[T]>) -> Result<()> {
        match values {
            Some(values) => self.set_object(total_id, key, values).await,
            None => self.delete(total_id, key).await.map(|_| ()),
        }
    }

    /// Reads a list stored by [`MetaStore::set_list`]; a missing entry reads
    /// as an empty list.
    pub async fn get_list<T: DeserializeOwned>(&self, total_id: &str, key: &str) -> Result<Vec<T>> {
        match self.get_string(total_id, key).await? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn set_string_list(&self, total_id: &str, key: &str, values: Option<&[String]>) -> Result<()> {
        self.set_list(total_id, key, values).await
    }

    pub async fn get_string_list(&self, total_id: &str, key: &str) -> Result<Vec<String>> {
        self.get_list(total_id, key).await
    }

    /// Keys stored for `total_id`, in backend order.
    #[instrument(skip(self))]
    pub async fn keys(&self, total_id: &str) -> Result<Vec<String>> {
        let rows = select([Column::Key])
            .where_match(Column::TotalId, &escape_pattern(total_id), MatchKind::Full)?
            .execute(&self.table, &self.executor)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| row.into_iter().next().flatten())
            .collect())
    }

    /// Removes one entry, returning the number of deleted rows.
    #[instrument(skip(self))]
    pub async fn delete(&self, total_id: &str, key: &str) -> Result<u64> {
        delete()
            .where_match(Column::TotalId, &escape_pattern(total_id), MatchKind::Full)?
            .and_match(Column::Key, &escape_pattern(key), MatchKind::Full)?
            .execute(&self.table, &self.executor)
            .await
    }

    /// Removes every entry of `total_id`.
    #[instrument(skip(self))]
    pub async fn purge(&self, total_id: &str) -> Result<u64> {
        let removed = delete()
            .where_match(Column::TotalId, &escape_pattern(total_id), MatchKind::Full)?
            .execute(&self.table, &self.executor)
            .await?;
        info!(removed = removed, "Purged entries");
        Ok(removed)
    }

    /// Entries whose `column` matches `pattern` under `kind` anchoring.
    #[instrument(skip(self))]
    pub async fn find(&self, column: Column, pattern: &str, kind: MatchKind) -> Result<Vec<MetaEntry>> {
        let rows = find_query(column, pattern, kind)?
            .execute(&self.table, &self.executor)
            .await?;

        let key_offset = self.table.resolve(Column::TotalId)?.len();
        let value_offset = key_offset + self.table.resolve(Column::Key)?.len();
        rows.into_iter()
            .map(|row| Self::entry_from_row(row, key_offset, value_offset))
            .collect()
    }

    /// Every entry of `total_id`.
    pub async fn entries(&self, total_id: &str) -> Result<Vec<MetaEntry>> {
        self.find(Column::TotalId, &escape_pattern(total_id), MatchKind::Full)
            .await
    }

    fn entry_from_row(row: Row, key_offset: usize, value_offset: usize) -> Result<MetaEntry> {
        let cell = |index: usize| -> Result<Option<String>> {
            row.get(index).cloned().ok_or_else(|| {
                MetaQueryError::Deserialization(format!("Row has no cell at position {}", index))
            })
        };
        let required = |index: usize, name: &str| -> Result<String> {
            cell(index)?.ok_or_else(|| {
                MetaQueryError::Deserialization(format!("Column {} is NULL", name))
            })
        };

        Ok(MetaEntry {
            total_id: required(0, Column::TotalId.name())?,
            key: required(key_offset, Column::Key.name())?,
            value: cell(value_offset)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_query_selects_every_column() {
        let table = TableMapping::default_meta("meta").unwrap();
        let compiled = find_query(Column::Key, "home", MatchKind::StartsWith)
            .unwrap()
            .compile(&table)
            .unwrap();

        assert_eq!(
            compiled.sql,
            "SELECT total_id, meta_key, meta_value FROM meta WHERE meta_key REGEXP ?;"
        );
        assert_eq!(compiled.params, vec!["^home".to_string()]);
        assert_eq!(compiled.result_width, 3);
    }

    #[test]
    fn test_decode_stored_falls_back_to_plain_text() {
        assert_eq!(decode_stored::<i64>("7".to_string()).unwrap(), 7);
        assert_eq!(decode_stored::<String>("plain".to_string()).unwrap(), "plain");
        assert!(decode_stored::<bool>("plain".to_string()).is_err());
    }
}
