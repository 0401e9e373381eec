use std::{
    collections::HashMap,
    fmt::Display,
    io::{self, BufRead, BufReader, Read},
    path::{Path, PathBuf},
    thread,
};

use run_script::{IoOptions, ScriptOptions};
use tracing::debug;
use uuid::Uuid;

use crate::config::RunnerConfig;

/// Termination status and the full stdout/stderr of one script execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionReport {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

impl Display for ExecutionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.exit_code {
            Some(code) => write!(f, "exit code {}", code),
            None => f.write_str("terminated by a signal"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("unable to start {program}: {reason}")]
    Spawn { program: String, reason: String },
    #[error("unable to capture the output streams of {program}")]
    MissingStream { program: String },
    #[error("unable to read {stream} of {program}")]
    Read {
        program: String,
        stream: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to wait for {program}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Executes generated script text out of process. Implementations block
/// until the process terminated.
pub trait ScriptRunner: Send + Sync {
    fn run(&self, script: &str, working_directory: &Path)
        -> Result<ExecutionReport, RunnerError>;
}

/// Runs R scripts through `Rscript`, fed on stdin by a small shell wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RScriptRunner {
    program: String,
    args: Vec<String>,
    env_vars: HashMap<String, String>,
}

impl Default for RScriptRunner {
    fn default() -> Self {
        Self::from_config(&RunnerConfig::default())
    }
}

impl RScriptRunner {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            env_vars: HashMap::new(),
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            env_vars: config.env.clone(),
        }
    }

    pub fn with_env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    /// Wrap the R script in a shell heredoc piped into the interpreter. The
    /// quoted delimiter keeps `$` and backslashes literal.
    fn wrap(&self, script: &str) -> String {
        let delimiter = format!("LESION_ADAPTERS_{}", Uuid::new_v4().simple());

        let mut command = shell_quote(&self.program);
        for arg in &self.args {
            command.push(' ');
            command.push_str(&shell_quote(arg));
        }

        let mut wrapped = format!("{} - <<'{}'\n", command, delimiter);
        wrapped.push_str(script);
        if !script.ends_with('\n') {
            wrapped.push('\n');
        }
        wrapped.push_str(&delimiter);
        wrapped.push('\n');

        wrapped
    }
}

impl ScriptRunner for RScriptRunner {
    fn run(
        &self,
        script: &str,
        working_directory: &Path,
    ) -> Result<ExecutionReport, RunnerError> {
        let mut options = ScriptOptions::new();

        options.exit_on_error = false;
        options.print_commands = false;
        options.output_redirection = IoOptions::Pipe;
        options.env_vars = Some(self.env_vars.clone());
        options.working_directory = Some(PathBuf::from(working_directory));

        let args = vec![];

        debug!(
            "running {} in {}",
            self.program,
            working_directory.to_string_lossy()
        );

        let mut child = run_script::spawn(&self.wrap(script), &args, &options).map_err(|err| {
            RunnerError::Spawn {
                program: self.program.clone(),
                reason: err.to_string(),
            }
        })?;

        let missing_stream = || RunnerError::MissingStream {
            program: self.program.clone(),
        };
        let child_stdout = child.stdout.take().ok_or_else(missing_stream)?;
        let child_stderr = child.stderr.take().ok_or_else(missing_stream)?;

        // both pipes are drained at once so a chatty stderr cannot block the child
        let stderr_handle = thread::spawn(move || collect_lines("stderr", child_stderr));
        let stdout = collect_lines("stdout", child_stdout);
        let stderr = stderr_handle
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("stderr reader panicked")));

        let status = child.wait().map_err(|source| RunnerError::Wait {
            program: self.program.clone(),
            source,
        })?;

        let stdout = stdout.map_err(|source| RunnerError::Read {
            program: self.program.clone(),
            stream: "stdout",
            source,
        })?;
        let stderr = stderr.map_err(|source| RunnerError::Read {
            program: self.program.clone(),
            stream: "stderr",
            source,
        })?;

        Ok(ExecutionReport {
            exit_code: status.code(),
            stdout,
            stderr,
        })
    }
}

/// Read a stream to its end, logging every line. Bytes that are not UTF-8
/// are replaced, never dropped, so the pipe stays open until the child exits.
fn collect_lines(stream: &str, reader: impl Read) -> io::Result<String> {
    let mut reader = BufReader::new(reader);
    let mut lines = String::new();
    let mut current_line = Vec::new();

    while reader.read_until(b'\n', &mut current_line)? > 0 {
        let line = String::from_utf8_lossy(&current_line);
        debug!("{}: {}", stream, line.trim_end());
        lines.push_str(&line);
        current_line.clear();
    }

    Ok(lines)
}

fn shell_quote(word: &str) -> String {
    format!("'{}'", word.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_script_is_fed_through_a_quoted_heredoc() {
        let runner = RScriptRunner::new("Rscript", vec!["--vanilla".to_owned()]);

        let wrapped = runner.wrap("np$save('a.npy', x)");
        let lines: Vec<&str> = wrapped.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("'Rscript' '--vanilla' - <<'LESION_ADAPTERS_"));
        assert_eq!(lines[1], "np$save('a.npy', x)");
        assert!(lines[0].ends_with(&format!("'{}'", lines[2])));
    }

    #[test]
    fn quotes_in_arguments_are_escaped() {
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn report_success_requires_exit_code_zero() {
        let report = |exit_code| ExecutionReport {
            exit_code,
            stdout: String::new(),
            stderr: String::new(),
        };

        assert!(report(Some(0)).success());
        assert!(!report(Some(1)).success());
        assert!(!report(None).success());
        assert_eq!(report(None).to_string(), "terminated by a signal");
    }

    #[cfg(unix)]
    #[test]
    fn runs_in_the_working_directory_and_captures_streams() {
        let directory = tempdir::TempDir::new("runner").unwrap();
        // `sh -s` reads the heredoc like Rscript would
        let runner = RScriptRunner::new("sh", vec!["-s".to_owned()]).with_env_var("GREETING", "hi");

        let report = runner
            .run(
                "echo $GREETING\necho oops >&2\ntouch made.txt\nexit 3",
                directory.path(),
            )
            .unwrap();

        assert_eq!(report.exit_code, Some(3));
        assert_eq!(report.stdout, "hi\n");
        assert_eq!(report.stderr, "oops\n");
        assert!(directory.path().join("made.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn invalid_utf8_keeps_every_line_and_the_exit_code() {
        let directory = tempdir::TempDir::new("runner").unwrap();
        let runner = RScriptRunner::new("sh", vec!["-s".to_owned()]);

        let report = runner
            .run(
                r"echo before
printf 'caf\351\n'
echo after
echo err1 >&2
printf '\377\n' >&2
echo err2 >&2
exit 1",
                directory.path(),
            )
            .unwrap();

        assert_eq!(report.exit_code, Some(1));
        assert_eq!(report.stdout, "before\ncaf\u{FFFD}\nafter\n");
        assert_eq!(report.stderr, "err1\n\u{FFFD}\nerr2\n");
    }

    #[test]
    fn lines_are_decoded_lossily() {
        let bytes: &[u8] = b"ok\n\xffbad\nlast";

        assert_eq!(
            collect_lines("stdout", bytes).unwrap(),
            "ok\n\u{FFFD}bad\nlast"
        );
    }
}
