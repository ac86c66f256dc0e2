//! A narrow seam around the execution of external tools.
//!
//! Every external program the alignment QC needs is described as a
//! [`ToolCommand`] and handed to a [`ToolRunner`]. [`SystemRunner`] actually
//! spawns the process; tests substitute a runner that answers from canned
//! output instead.

use std::ffi::OsStr;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;

use anyhow::bail;
use anyhow::Context;
use tracing::debug;
use tracing::info;

use crate::utils::display::CommandLine;

/// An external command: program, arguments and optional working directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolCommand {
    /// The program to execute.
    pub program: String,

    /// Arguments, in order.
    pub args: Vec<String>,

    /// Directory to execute the program in. Defaults to the current one.
    pub working_dir: Option<PathBuf>,
}

impl ToolCommand {
    /// Creates a new [`ToolCommand`] with no arguments.
    pub fn new<S>(program: S) -> Self
    where
        S: Into<String>,
    {
        ToolCommand {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    /// Adds an argument.
    pub fn arg<S>(mut self, arg: S) -> Self
    where
        S: Into<String>,
    {
        self.args.push(arg.into());
        self
    }

    /// Adds a path argument.
    pub fn path_arg<P>(self, path: P) -> Self
    where
        P: AsRef<Path>,
    {
        let arg = path.as_ref().to_string_lossy().into_owned();
        self.arg(arg)
    }

    /// Adds the thread count argument (`-t N`) if a CPU hint was given.
    pub fn threads(self, cpus: Option<usize>) -> Self {
        match cpus {
            Some(n) => self.arg("-t").arg(n.to_string()),
            None => self,
        }
    }

    /// Sets the working directory.
    pub fn current_dir<P>(mut self, dir: P) -> Self
    where
        P: Into<PathBuf>,
    {
        self.working_dir = Some(dir.into());
        self
    }

    /// Returns the argument following `flag`, if any.
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|arg| arg == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

/// The result of running a [`ToolCommand`] to completion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code. `None` if the process was terminated by a signal.
    pub status: Option<i32>,

    /// Everything written to stdout.
    pub stdout: String,

    /// Everything written to stderr.
    pub stderr: String,
}

impl ToolOutput {
    /// A successful run that printed `stdout`.
    pub fn success<S>(stdout: S) -> Self
    where
        S: Into<String>,
    {
        ToolOutput {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Whether the process exited with status zero.
    pub fn is_success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs external commands, blocking until they exit.
pub trait ToolRunner {
    /// Runs `command` to completion and captures its output. A non-zero exit
    /// is not an error at this level; see [`run_checked`].
    fn run(&self, command: &ToolCommand) -> anyhow::Result<ToolOutput>;
}

impl<R> ToolRunner for &R
where
    R: ToolRunner + ?Sized,
{
    fn run(&self, command: &ToolCommand) -> anyhow::Result<ToolOutput> {
        (**self).run(command)
    }
}

/// Spawns commands as child processes of this one.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, command: &ToolCommand) -> anyhow::Result<ToolOutput> {
        let mut process = Command::new(OsStr::new(&command.program));
        process.args(&command.args);

        if let Some(dir) = &command.working_dir {
            process.current_dir(dir);
        }

        let output = process
            .output()
            .with_context(|| format!("failed to run {}", command.program))?;

        Ok(ToolOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Runs a command and fails unless it exits successfully.
pub fn run_checked<R>(runner: &R, command: &ToolCommand) -> anyhow::Result<ToolOutput>
where
    R: ToolRunner + ?Sized,
{
    info!("RUNNING: {}", CommandLine(&command.program, &command.args));

    let output = runner.run(command)?;
    if !output.stderr.is_empty() {
        debug!("stderr: {}", output.stderr.trim_end());
    }

    if !output.is_success() {
        let status = match output.status {
            Some(code) => code.to_string(),
            None => String::from("signal"),
        };

        bail!(
            "{} exited with status {}: {}",
            CommandLine(&command.program, &command.args),
            status,
            output.stderr.trim()
        );
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(ToolOutput);

    impl ToolRunner for Canned {
        fn run(&self, _: &ToolCommand) -> anyhow::Result<ToolOutput> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_command_builder() {
        let command = ToolCommand::new("sambamba")
            .arg("flagstat")
            .threads(Some(4))
            .path_arg("sample.bam")
            .current_dir("/tmp");

        assert_eq!(command.args, vec!["flagstat", "-t", "4", "sample.bam"]);
        assert_eq!(command.value_of("-t"), Some("4"));
        assert_eq!(command.value_of("-o"), None);
        assert_eq!(command.working_dir, Some(PathBuf::from("/tmp")));

        let command = ToolCommand::new("sambamba").threads(None);
        assert!(command.args.is_empty());
    }

    #[test]
    fn test_run_checked_passes_successful_output_through() {
        let runner = Canned(ToolOutput::success("ok\n"));
        let output = run_checked(&runner, &ToolCommand::new("true")).unwrap();
        assert_eq!(output.stdout, "ok\n");
    }

    #[test]
    fn test_run_checked_fails_on_non_zero_exit() {
        let runner = Canned(ToolOutput {
            status: Some(1),
            stdout: String::new(),
            stderr: String::from("[E::hts_open_format] fail to open file\n"),
        });

        let err = run_checked(&runner, &ToolCommand::new("samtools").arg("head"))
            .unwrap_err()
            .to_string();
        assert!(err.contains("samtools head"));
        assert!(err.contains("status 1"));
        assert!(err.contains("fail to open file"));
    }

    #[test]
    fn test_run_checked_fails_on_signal() {
        let runner = Canned(ToolOutput {
            status: None,
            ..Default::default()
        });
        assert!(run_checked(&runner, &ToolCommand::new("java")).is_err());
    }
}
