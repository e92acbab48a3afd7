//! Persistence of automatic export configurations.

use duckdb::params;
use std::collections::HashMap;
use tabport_core::entities::AutomaticExportConfig;

use crate::{DatabaseError, TableStore};

const SELECT_CONFIG_COLUMNS: &str =
    "SELECT id, table_name, output_file_name, transform_id, data_source FROM tabport_export_config";

impl TableStore {
    /// Store a new configuration, assigning the next free id.
    ///
    /// Returns the stored configuration with its id set.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::DuckDb`] if any statement fails; nothing is
    /// stored in that case.
    pub fn insert_export_config(
        &mut self,
        config: &AutomaticExportConfig,
    ) -> Result<AutomaticExportConfig, DatabaseError> {
        let tx = self.conn.transaction()?;
        let next: i64 = tx.query_row(
            "SELECT COALESCE(MAX(id), 0) + 1 FROM tabport_export_config",
            [],
            |row| row.get(0),
        )?;
        let id = i32::try_from(next).map_err(|_| {
            DatabaseError::Validation("export configuration ids exhausted".to_string())
        })?;
        tx.execute(
            "INSERT INTO tabport_export_config
                (id, table_name, output_file_name, transform_id, data_source)
             VALUES (?, ?, ?, ?, ?)",
            params![
                id,
                config.table_name,
                config.output_file_name,
                config.transform_id,
                config.data_source
            ],
        )?;
        insert_columns(&tx, id, &config.columns)?;
        tx.commit()?;

        tracing::debug!(id, table = %config.table_name, "stored export configuration");
        Ok(AutomaticExportConfig {
            id,
            ..config.clone()
        })
    }

    /// Replace a stored configuration, including its column list.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::ConfigNotFound`] if `config.id` is not stored,
    /// or [`DatabaseError::DuckDb`] if any statement fails.
    pub fn update_export_config(
        &mut self,
        config: &AutomaticExportConfig,
    ) -> Result<(), DatabaseError> {
        let tx = self.conn.transaction()?;
        let changed = tx.execute(
            "UPDATE tabport_export_config
             SET table_name = ?, output_file_name = ?, transform_id = ?, data_source = ?
             WHERE id = ?",
            params![
                config.table_name,
                config.output_file_name,
                config.transform_id,
                config.data_source,
                config.id
            ],
        )?;
        if changed == 0 {
            return Err(DatabaseError::ConfigNotFound { id: config.id });
        }
        tx.execute(
            "DELETE FROM tabport_export_config_columns WHERE id_config = ?",
            params![config.id],
        )?;
        insert_columns(&tx, config.id, &config.columns)?;
        tx.commit()?;
        Ok(())
    }

    /// Delete a configuration and its columns. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::DuckDb`] if any statement fails.
    pub fn delete_export_config(&mut self, id: i32) -> Result<bool, DatabaseError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM tabport_export_config_columns WHERE id_config = ?",
            params![id],
        )?;
        let removed =
            tx.execute("DELETE FROM tabport_export_config WHERE id = ?", params![id])?;
        tx.commit()?;
        Ok(removed > 0)
    }

    /// Look up one configuration with its columns.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::DuckDb`] if a query fails.
    pub fn find_export_config(
        &self,
        id: i32,
    ) -> Result<Option<AutomaticExportConfig>, DatabaseError> {
        let sql = format!("{SELECT_CONFIG_COLUMNS} WHERE id = ?");
        let mut config = match self.conn.query_row(&sql, params![id], read_config) {
            Ok(config) => config,
            Err(duckdb::Error::QueryReturnedNoRows) => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        config.columns = self.export_config_columns(id)?;
        Ok(Some(config))
    }

    /// List every configuration ordered by id.
    ///
    /// Column lists are only populated when `load_columns` is set.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::DuckDb`] if a query fails.
    pub fn list_export_configs(
        &self,
        load_columns: bool,
    ) -> Result<Vec<AutomaticExportConfig>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_CONFIG_COLUMNS} ORDER BY id"))?;
        let mut configs = stmt
            .query_map([], read_config)?
            .collect::<Result<Vec<_>, _>>()?;
        if !load_columns {
            return Ok(configs);
        }

        let mut stmt = self.conn.prepare(
            "SELECT id_config, column_name FROM tabport_export_config_columns
             ORDER BY id_config, position",
        )?;
        let mut columns: HashMap<i32, Vec<String>> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i32>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (id, column) = row?;
            columns.entry(id).or_default().push(column);
        }
        for config in &mut configs {
            config.columns = columns.remove(&config.id).unwrap_or_default();
        }
        Ok(configs)
    }

    fn export_config_columns(&self, id: i32) -> Result<Vec<String>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT column_name FROM tabport_export_config_columns
             WHERE id_config = ? ORDER BY position",
        )?;
        let columns = stmt
            .query_map(params![id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }
}

fn insert_columns(
    conn: &duckdb::Connection,
    id: i32,
    columns: &[String],
) -> Result<(), DatabaseError> {
    let mut stmt = conn.prepare(
        "INSERT INTO tabport_export_config_columns (id_config, position, column_name)
         VALUES (?, ?, ?)",
    )?;
    for (position, column) in (0_i32..).zip(columns) {
        stmt.execute(params![id, position, column])?;
    }
    Ok(())
}

fn read_config(row: &duckdb::Row<'_>) -> duckdb::Result<AutomaticExportConfig> {
    Ok(AutomaticExportConfig {
        id: row.get(0)?,
        table_name: row.get(1)?,
        output_file_name: row.get(2)?,
        columns: Vec::new(),
        transform_id: row.get(3)?,
        data_source: row.get(4)?,
    })
}
