//! Import orchestration: drive a [`BulkWriter`] from an [`ImportSource`].
//!
//! One run is one transaction. Per-row failures become ERROR messages tied
//! to the row's item number and the row counts as ignored; the run goes on
//! unless `stop_on_errors` is set.
//!
//! A statement the database rejects invalidates the whole transaction. The
//! importer then rolls back, opens a new transaction, replays the rows
//! already written in this run (after emptying the table again when asked)
//! and carries on with the next row.

use duckdb::Connection;
use serde::{Deserialize, Serialize};
use tabport_config::ImportConfig;
use tabport_core::codec::RowCodec;
use tabport_core::element::{Row, RowElement};
use tabport_core::result::{ImportMessage, ImportResult};
use tabport_db::{BulkWriter, DatabaseError, WriterState};

use crate::source::ImportSource;

/// Behaviour switches of one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Update rows whose primary key already exists instead of ignoring them.
    pub update_existing: bool,
    /// Roll back and return at the first failing row.
    pub stop_on_errors: bool,
    /// Delete every row of the table before importing.
    pub empty_table_first: bool,
}

impl ImportOptions {
    /// Options used by the folder sweep.
    #[must_use]
    pub const fn from_config(config: &ImportConfig) -> Self {
        Self {
            update_existing: config.update_existing_rows,
            stop_on_errors: config.stop_on_errors,
            empty_table_first: config.empty_table_before_import,
        }
    }
}

/// What happened to one row.
enum Outcome {
    Created,
    Updated,
    Ignored,
}

impl Outcome {
    /// Whether the row changed the table and must be replayed after a restart.
    const fn wrote(&self) -> bool {
        matches!(self, Self::Created | Self::Updated)
    }
}

/// Running counters of one import run.
#[derive(Default)]
struct Tally {
    created: u32,
    updated: u32,
    ignored: u32,
    item: u32,
    messages: Vec<ImportMessage>,
}

impl Tally {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Created => self.created += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::Ignored => self.ignored += 1,
        }
    }

    fn fail(&mut self, error: &DatabaseError) {
        tracing::debug!(item = self.item, %error, "row rejected");
        self.messages
            .push(ImportMessage::error(error.to_string(), self.item));
        self.ignored += 1;
    }

    fn finish(self) -> ImportResult {
        ImportResult::new(self.created, self.updated, self.ignored, self.messages)
    }
}

/// Runs imports with a fixed value codec.
#[derive(Debug, Clone, Default)]
pub struct Importer {
    codec: RowCodec,
}

impl Importer {
    #[must_use]
    pub const fn new(codec: RowCodec) -> Self {
        Self { codec }
    }

    /// Import every row of `source` into `table`.
    ///
    /// Never fails: session-level problems (unreadable header, unknown
    /// column, unavailable transaction) come back as a result holding a
    /// single ERROR message on item 0. Counts accumulated before a stop are
    /// kept. A failure of `empty_table_first` is logged and the import goes
    /// on into the existing rows.
    pub fn run(
        &self,
        conn: &mut Connection,
        source: &mut dyn ImportSource,
        table: &str,
        options: ImportOptions,
    ) -> ImportResult {
        let columns = match source.column_names() {
            Ok(columns) => columns,
            Err(error) => {
                tracing::info!(table, %error, "import source unreadable");
                return ImportResult::failed(error.to_string());
            }
        };
        let mut writer = match BulkWriter::begin(&mut *conn, table, &columns, self.codec.clone())
        {
            Ok(writer) => writer,
            Err(error) => {
                tracing::info!(table, %error, "import session not started");
                return ImportResult::failed(error.to_string());
            }
        };

        let mut emptied = false;
        if options.empty_table_first {
            match writer.empty_table() {
                Ok(removed) => {
                    emptied = true;
                    tracing::debug!(table, removed, "table emptied before import");
                }
                Err(error) => {
                    tracing::error!(
                        table,
                        %error,
                        "failed to empty table; importing into existing rows"
                    );
                    if writer.state() == WriterState::Aborted {
                        rollback(&mut writer);
                        drop(writer);
                        writer = match BulkWriter::begin(
                            &mut *conn,
                            table,
                            &columns,
                            self.codec.clone(),
                        ) {
                            Ok(writer) => writer,
                            Err(error) => return ImportResult::failed(error.to_string()),
                        };
                    }
                }
            }
        }

        let mut tally = Tally::default();
        let mut written: Vec<Row> = Vec::new();
        loop {
            let row = match source.next_row() {
                Ok(Some(row)) => row,
                Ok(None) => break,
                Err(error) => {
                    let item = tally.item + 1;
                    tracing::error!(table, item, %error, "import source failed");
                    rollback(&mut writer);
                    tally.messages.push(ImportMessage::error(error.to_string(), item));
                    return tally.finish();
                }
            };
            tally.item += 1;

            match import_row(&mut writer, &row, options.update_existing, !emptied) {
                Ok(outcome) => {
                    tally.record(&outcome);
                    if outcome.wrote() {
                        written.push(row);
                    }
                }
                Err(error) => {
                    tally.fail(&error);
                    if options.stop_on_errors {
                        rollback(&mut writer);
                        let result = tally.finish();
                        log_summary(table, &result, false);
                        return result;
                    }
                    if writer.state() == WriterState::Aborted {
                        rollback(&mut writer);
                        drop(writer);
                        tracing::warn!(
                            table,
                            item = tally.item,
                            replayed = written.len(),
                            "restarting transaction after a rejected row"
                        );
                        let resumed =
                            self.resume(&mut *conn, table, &columns, emptied, options, &written);
                        writer = match resumed {
                            Ok(writer) => writer,
                            Err(error) => {
                                tracing::error!(table, %error, "import could not be resumed");
                                tally
                                    .messages
                                    .push(ImportMessage::error(error.to_string(), tally.item));
                                let result = tally.finish();
                                log_summary(table, &result, false);
                                return result;
                            }
                        };
                    }
                }
            }
        }

        if let Err(error) = writer.commit() {
            tracing::error!(table, %error, "import commit failed");
            tally
                .messages
                .push(ImportMessage::error(error.to_string(), tally.item));
            let result = tally.finish();
            log_summary(table, &result, false);
            return result;
        }
        let result = tally.finish();
        log_summary(table, &result, true);
        result
    }

    /// Open a fresh transaction and write `written` again, as they were
    /// written before the previous transaction was lost.
    fn resume<'conn>(
        &self,
        conn: &'conn mut Connection,
        table: &str,
        columns: &[String],
        emptied: bool,
        options: ImportOptions,
        written: &[Row],
    ) -> Result<BulkWriter<'conn>, DatabaseError> {
        let mut writer = BulkWriter::begin(conn, table, columns, self.codec.clone())?;
        let replayed = replay(&mut writer, emptied, options, written);
        if let Err(error) = replayed {
            rollback(&mut writer);
            return Err(error);
        }
        Ok(writer)
    }
}

fn replay(
    writer: &mut BulkWriter<'_>,
    emptied: bool,
    options: ImportOptions,
    written: &[Row],
) -> Result<(), DatabaseError> {
    if emptied {
        writer.empty_table()?;
    }
    for row in written {
        import_row(writer, row, options.update_existing, !emptied)?;
    }
    Ok(())
}

fn import_row(
    writer: &mut BulkWriter<'_>,
    row: &[RowElement],
    update_existing: bool,
    check_existing: bool,
) -> Result<Outcome, DatabaseError> {
    if check_existing && writer.exists_by_primary_key(row)? {
        if update_existing {
            writer.update(row)?;
            return Ok(Outcome::Updated);
        }
        return Ok(Outcome::Ignored);
    }
    writer.insert(row)?;
    Ok(Outcome::Created)
}

fn rollback(writer: &mut BulkWriter<'_>) {
    if let Err(error) = writer.rollback() {
        tracing::error!(table = writer.table(), %error, "rollback failed");
    }
}

fn log_summary(table: &str, result: &ImportResult, committed: bool) {
    tracing::info!(
        table,
        committed,
        created = result.created,
        updated = result.updated,
        ignored = result.ignored,
        errors = result.error_count(),
        "import finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use pretty_assertions::assert_eq;
    use tabport_core::enums::Severity;

    /// In-memory source; `fail_at` makes the n-th read fail.
    struct VecSource {
        columns: Vec<String>,
        rows: std::vec::IntoIter<Row>,
        fail_at: Option<usize>,
        reads: usize,
    }

    impl VecSource {
        fn new(columns: &[&str], rows: Vec<Row>) -> Self {
            Self {
                columns: columns.iter().map(ToString::to_string).collect(),
                rows: rows.into_iter(),
                fail_at: None,
                reads: 0,
            }
        }
    }

    impl ImportSource for VecSource {
        fn column_names(&mut self) -> Result<Vec<String>, SourceError> {
            Ok(self.columns.clone())
        }

        fn next_row(&mut self) -> Result<Option<Row>, SourceError> {
            self.reads += 1;
            if self.fail_at == Some(self.reads) {
                return Err(SourceError::Io(std::io::Error::other("disk gone")));
            }
            Ok(self.rows.next())
        }

        fn close(&mut self) {}
    }

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, name VARCHAR);")
            .unwrap();
        conn
    }

    fn row(id: &str, name: &str) -> Row {
        vec![RowElement::text("id", id), RowElement::text("name", name)]
    }

    fn count(conn: &Connection) -> i64 {
        conn.query_row("SELECT count(*) FROM t", [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn unknown_column_fails_the_session() {
        let mut conn = conn();
        let mut source = VecSource::new(&["id", "nope"], vec![row("1", "a")]);
        let result =
            Importer::default().run(&mut conn, &mut source, "t", ImportOptions::default());
        assert_eq!(result.processed(), 0);
        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages[0].item_number, 0);
        assert_eq!(result.messages[0].severity, Severity::Error);
    }

    #[test]
    fn source_failure_rolls_back_and_reports() {
        let mut conn = conn();
        let mut source = VecSource::new(&["id", "name"], vec![row("1", "a"), row("2", "b")]);
        source.fail_at = Some(2);
        let result =
            Importer::default().run(&mut conn, &mut source, "t", ImportOptions::default());
        assert_eq!(result.created, 1);
        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages[0].item_number, 2);
        assert_eq!(count(&conn), 0);
    }

    #[test]
    fn empty_row_is_an_element_mismatch() {
        let mut conn = conn();
        let mut source =
            VecSource::new(&["id", "name"], vec![row("1", "a"), Vec::new(), row("3", "c")]);
        let result =
            Importer::default().run(&mut conn, &mut source, "t", ImportOptions::default());
        assert_eq!((result.created, result.ignored), (2, 1));
        assert_eq!(result.messages[0].item_number, 2);
        assert_eq!(count(&conn), 2);
    }

    #[test]
    fn emptied_table_skips_existence_checks() {
        let mut conn = conn();
        conn.execute_batch("INSERT INTO t VALUES (1, 'old'), (9, 'gone');")
            .unwrap();
        let mut source = VecSource::new(&["id", "name"], vec![row("1", "new")]);
        let options = ImportOptions {
            empty_table_first: true,
            ..ImportOptions::default()
        };
        let result = Importer::default().run(&mut conn, &mut source, "t", options);
        assert_eq!((result.created, result.updated, result.ignored), (1, 0, 0));
        let name: String = conn
            .query_row("SELECT name FROM t WHERE id = 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(name, "new");
        assert_eq!(count(&conn), 1);
    }
}
