use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::script_runner::{ExecutionReport, RunnerError, ScriptRunner};

/// Stands in for R: records the scripts it gets and writes the files an
/// analysis routine would have written.
pub(crate) struct FakeRunner {
    exit_code: Option<i32>,
    stderr: String,
    writes: Vec<&'static str>,
    scripts: Mutex<Vec<(String, PathBuf)>>,
}

impl FakeRunner {
    pub(crate) fn writing(files: &[&'static str]) -> Self {
        Self {
            exit_code: Some(0),
            stderr: String::new(),
            writes: files.to_vec(),
            scripts: Mutex::new(vec![]),
        }
    }

    pub(crate) fn failing(exit_code: Option<i32>, stderr: &str) -> Self {
        Self {
            exit_code,
            stderr: stderr.to_owned(),
            writes: vec![],
            scripts: Mutex::new(vec![]),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.scripts.lock().unwrap().len()
    }

    pub(crate) fn scripts(&self) -> Vec<(String, PathBuf)> {
        self.scripts.lock().unwrap().clone()
    }
}

impl ScriptRunner for FakeRunner {
    fn run(
        &self,
        script: &str,
        working_directory: &Path,
    ) -> Result<ExecutionReport, RunnerError> {
        self.scripts
            .lock()
            .unwrap()
            .push((script.to_owned(), working_directory.to_path_buf()));

        for file in &self.writes {
            fs::write(working_directory.join(file), b"written").unwrap();
        }

        Ok(ExecutionReport {
            exit_code: self.exit_code,
            stdout: format!("ran {} lines\n", script.lines().count()),
            stderr: self.stderr.clone(),
        })
    }
}

/// Create empty files standing in for images
pub(crate) fn touch(directory: &Path, files: &[&str]) {
    for file in files {
        fs::write(directory.join(file), b"").unwrap();
    }
}
