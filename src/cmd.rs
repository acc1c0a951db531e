use derive_more::Display;
use derive_more::From;
use log::{info, warn};
use std::ffi::OsStr;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::io::{self, AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader, Lines};
use tokio::process::Command;
use tokio::select;

#[derive(Debug, From, Display)]
pub enum CommandError {
    #[display(fmt = "IO Error occurred while executing command: {}", _0)]
    IO(io::Error),
    #[display(fmt = "Provided command string didn't contain a command. (Was it empty?)")]
    MissingCommand,
    #[display(fmt = "Process exited with non-zero exit code: Code {}", _0)]
    NonZeroExitCode(i32),
    #[display(fmt = "Process was terminated before it could exit")]
    #[from(ignore)]
    Terminated,
}

pub type CommandResult<T> = Result<T, CommandError>;

/// Executes `program` with `args` in the provided working directory
/// piping its output into the application log and failing if the
/// process exits unsuccessfully
pub async fn run_command(
    working_dir: impl AsRef<Path>,
    program: impl AsRef<OsStr>,
    args: &[&str],
) -> CommandResult<()> {
    let working_dir = working_dir.as_ref();
    let program = program.as_ref();
    info!("{} $ {}", working_dir.display(), describe(program, args));

    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let exit_status = pipe_and_wait(command).await?;
    check_status(exit_status)
}

/// Executes `program` with `args` in the provided working directory
/// and returns everything it wrote to stdout. Stderr is still piped
/// into the log
pub async fn run_command_output(
    working_dir: impl AsRef<Path>,
    program: impl AsRef<OsStr>,
    args: &[&str],
) -> CommandResult<String> {
    let working_dir = working_dir.as_ref();
    let program = program.as_ref();
    info!("{} $ {}", working_dir.display(), describe(program, args));

    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command.spawn()?;
    let mut stdout = child.stdout.take();
    let mut stderr = OptionalReader::new(child.stderr.take());

    let read_stdout = async {
        let mut buffer = Vec::new();
        if let Some(stdout) = &mut stdout {
            stdout.read_to_end(&mut buffer).await?;
        }
        Ok::<_, io::Error>(buffer)
    };
    let drain_stderr = async {
        while let Some(line) = stderr.next_line().await? {
            warn!("{line}");
        }
        Ok::<_, io::Error>(())
    };

    let (buffer, _) = tokio::try_join!(read_stdout, drain_stderr)?;
    let exit_status = child.wait().await?;
    check_status(exit_status)?;

    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Executes `program` and returns only its exit code without logging
/// any of its output. Used for commands that answer through their
/// exit code such as `git diff --quiet`
pub async fn run_command_code(
    working_dir: impl AsRef<Path>,
    program: impl AsRef<OsStr>,
    args: &[&str],
) -> CommandResult<i32> {
    let status = Command::new(program)
        .args(args)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await?;
    status.code().ok_or(CommandError::Terminated)
}

fn check_status(exit_status: ExitStatus) -> CommandResult<()> {
    match exit_status.code() {
        Some(0) => Ok(()),
        Some(code) => Err(CommandError::NonZeroExitCode(code)),
        None => Err(CommandError::Terminated),
    }
}

fn describe(program: &OsStr, args: &[&str]) -> String {
    let mut out = program.to_string_lossy().into_owned();
    for arg in args {
        out.push(' ');
        if arg.contains(char::is_whitespace) {
            out.push('"');
            out.push_str(arg);
            out.push('"');
        } else {
            out.push_str(arg);
        }
    }
    out
}

/// Line reader over an optional child stream. A missing stream
/// behaves like one that is already at its end
struct OptionalReader<V> {
    child: Option<Lines<BufReader<V>>>,
}

impl<V> OptionalReader<V>
where
    V: Unpin + AsyncRead,
{
    fn new(value: Option<V>) -> Self {
        Self {
            child: value.map(|value| BufReader::new(value).lines()),
        }
    }

    async fn next_line(&mut self) -> io::Result<Option<String>> {
        match &mut self.child {
            Some(child) => {
                let line = child.next_line().await?;
                if line.is_none() {
                    self.child = None;
                }
                Ok(line)
            }
            None => Ok(None),
        }
    }

    fn is_done(&self) -> bool {
        self.child.is_none()
    }
}

/// Spawns the command child piping its output to the logging for
/// the application and waiting until the process exits returning the
/// exit status of the program or an Error
async fn pipe_and_wait(mut command: Command) -> CommandResult<ExitStatus> {
    let mut child = command.spawn()?;

    let mut stdout = OptionalReader::new(child.stdout.take());
    let mut stderr = OptionalReader::new(child.stderr.take());

    while !stdout.is_done() || !stderr.is_done() {
        select! {
            result = stdout.next_line(), if !stdout.is_done() => {
                if let Some(line) = result? {
                    info!("{line}");
                }
            }
            result = stderr.next_line(), if !stderr.is_done() => {
                if let Some(line) = result? {
                    warn!("{line}");
                }
            }
        }
    }

    Ok(child.wait().await?)
}

/// Splits the command into the command itself and a vector
/// containing the additional arguments
pub fn split_command(value: &str) -> Option<(&str, Vec<&str>)> {
    let mut parts = value.split_whitespace();
    let command = parts.next()?;
    let args = parts.collect::<Vec<&str>>();
    Some((command, args))
}
