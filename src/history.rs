use std::{
    fs,
    path::{Path, PathBuf},
};

use dirs::data_dir;
use rusqlite::{params, Connection};
use rusqlite_migration::{Migrations, M};
use uuid::Uuid;

const DB_FILE_NAME: &str = "history.db";

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("no data directory is known for this platform")]
    MissingDataDirectory,
    #[error("unable to create directory for the run history: {0}")]
    UnableToCreateDirectory(std::io::Error),
    #[error("unable to migrate the run history: {0}")]
    Migration(#[from] rusqlite_migration::Error),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

/// One execution of an adapter as it is kept in the history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub id: String,
    pub adapter: String,
    /// Final state of the adapter, `succeeded` or `failed`
    pub state: String,
    pub exit_code: Option<i32>,
    pub error: Option<String>,
    pub outputs: Vec<(String, String)>,
    /// Set by the database when the run is stored
    pub recorded_at: Option<String>,
}

impl RunRecord {
    pub fn new(adapter: &str, state: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            adapter: adapter.to_owned(),
            state: state.to_owned(),
            exit_code: None,
            error: None,
            outputs: vec![],
            recorded_at: None,
        }
    }
}

/// Open the history database, at `path` or in the platform data directory,
/// and bring its schema up to date.
pub fn open(path: Option<&Path>) -> Result<Connection, HistoryError> {
    let db_file = match path {
        Some(path) => path.to_path_buf(),
        None => get_state_directory()?.join(DB_FILE_NAME),
    };

    let mut connection = Connection::open(db_file)?;
    get_migrations().to_latest(&mut connection)?;

    Ok(connection)
}

pub fn open_in_memory() -> Result<Connection, HistoryError> {
    let mut connection = Connection::open_in_memory()?;
    get_migrations().to_latest(&mut connection)?;

    Ok(connection)
}

pub fn record(connection: &mut Connection, run: &RunRecord) -> Result<(), HistoryError> {
    let transaction = connection.transaction()?;

    transaction.execute(
        "INSERT INTO run_report (id, adapter, state, exit_code, error) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![run.id, run.adapter, run.state, run.exit_code, run.error],
    )?;

    for (name, path) in &run.outputs {
        transaction.execute(
            "INSERT INTO run_output (run_id, name, path) VALUES (?1, ?2, ?3)",
            params![run.id, name, path],
        )?;
    }

    transaction.commit()?;

    Ok(())
}

/// The most recent runs, newest first
pub fn recent(connection: &Connection, limit: usize) -> Result<Vec<RunRecord>, HistoryError> {
    let mut statement = connection.prepare(
        "SELECT id, adapter, state, exit_code, error, recorded_at FROM run_report
         ORDER BY recorded_at DESC, rowid DESC LIMIT ?1",
    )?;

    let mut runs = statement
        .query_map(params![limit as i64], |row| {
            Ok(RunRecord {
                id: row.get(0)?,
                adapter: row.get(1)?,
                state: row.get(2)?,
                exit_code: row.get(3)?,
                error: row.get(4)?,
                outputs: vec![],
                recorded_at: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut outputs =
        connection.prepare("SELECT name, path FROM run_output WHERE run_id = ?1 ORDER BY name")?;

    for run in runs.iter_mut() {
        run.outputs = outputs
            .query_map(params![run.id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
    }

    Ok(runs)
}

/// Get the directory that stores the sqlite DB file
/// Ensures that the directory exists if it does not yet exist.
fn get_state_directory() -> Result<PathBuf, HistoryError> {
    let directory = data_dir()
        .map(|path| path.join("lesion-adapters"))
        .ok_or(HistoryError::MissingDataDirectory)?;

    fs::create_dir_all(&directory).map_err(HistoryError::UnableToCreateDirectory)?;

    Ok(directory)
}

fn get_migrations<'m>() -> Migrations<'m> {
    Migrations::new(vec![M::up(
        r#"
        CREATE TABLE run_report (
            id TEXT PRIMARY KEY,
            adapter TEXT NOT NULL,
            state TEXT NOT NULL,
            exit_code INTEGER,
            error TEXT,
            recorded_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        CREATE TABLE run_output (
            run_id TEXT NOT NULL REFERENCES run_report (id),
            name TEXT NOT NULL,
            path TEXT NOT NULL,
            PRIMARY KEY (run_id, name)
        );
        "#,
    )])
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;

    #[test]
    fn migrations_are_valid() {
        assert!(get_migrations().validate().is_ok());
    }

    #[test]
    fn runs_are_recorded_with_their_outputs() {
        let mut connection = open_in_memory().unwrap();

        let mut run = RunRecord::new("lesion_clusters", "succeeded");
        run.exit_code = Some(0);
        run.outputs = vec![
            ("centers".to_owned(), "/data/centers.nii.gz".to_owned()),
            ("nnmap".to_owned(), "/data/nnmap.nii.gz".to_owned()),
        ];
        record(&mut connection, &run).unwrap();

        let runs = recent(&connection, 10).unwrap();

        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].id, run.id);
        assert_eq!(runs[0].exit_code, Some(0));
        assert_eq!(runs[0].outputs, run.outputs);
        assert!(runs[0].recorded_at.is_some());
    }

    #[test]
    fn newest_runs_come_first_and_limit_applies() {
        let mut connection = open_in_memory().unwrap();

        for adapter in ["central_vein_sign", "lesion_segmentation", "paramagnetic_rim_lesion"] {
            let mut run = RunRecord::new(adapter, "failed");
            run.error = Some("script failed with exit code 1".to_owned());
            record(&mut connection, &run).unwrap();
        }

        let runs = recent(&connection, 2).unwrap();

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].adapter, "paramagnetic_rim_lesion");
        assert_eq!(runs[1].adapter, "lesion_segmentation");
        assert!(runs.iter().all(|run| run.outputs.is_empty()));
    }

    #[test]
    fn history_file_persists_between_connections() {
        let directory = TempDir::new("history").unwrap();
        let path = directory.path().join(DB_FILE_NAME);

        let mut connection = open(Some(&path)).unwrap();
        record(&mut connection, &RunRecord::new("lesion_segmentation", "succeeded")).unwrap();
        drop(connection);

        let connection = open(Some(&path)).unwrap();
        assert_eq!(recent(&connection, 10).unwrap().len(), 1);
    }
}
