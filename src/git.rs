use crate::cmd::{run_command, run_command_code, run_command_output, CommandError};
use crate::prompt::confirm;
use crate::status::{RepoStatus, StatusFormat};
use derive_more::{Display, From};
use log::{error, info, warn};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, From, Display)]
pub enum RepositoryError {
    #[display(fmt = "IO Error occurred while working with repositories: {}", _0)]
    IO(io::Error),
    #[display(fmt = "Unable to execute git command: {}", _0)]
    CommandError(CommandError),
    #[display(fmt = "Not a git repository: {:?}", _0)]
    #[from(ignore)]
    NotARepository(PathBuf),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

const GIT: &str = "git";

/// A git working tree on disk, operated on through the git command line
#[derive(Debug, Clone)]
pub struct Repository {
    name: String,
    path: PathBuf,
}

impl Repository {
    /// Opens the working tree at `path` failing if it does not contain
    /// a git directory
    pub fn open(name: impl Into<String>, path: impl Into<PathBuf>) -> RepoResult<Self> {
        let path = path.into();
        if !is_valid_git(&path) {
            return Err(RepositoryError::NotARepository(path));
        }
        Ok(Self {
            name: name.into(),
            path,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Absolute form of the repository path for user facing messages
    pub fn display_path(&self) -> PathBuf {
        self.path.canonicalize().unwrap_or_else(|_| self.path.clone())
    }

    pub async fn status(&self, format: StatusFormat) -> RepoResult<RepoStatus> {
        let output = run_command_output(&self.path, GIT, format.git_args()).await?;
        Ok(format.classify(&output))
    }

    /// Removes `relative` from both the index and the working tree.
    /// Paths git does not track are ignored
    pub async fn remove_tracked(&self, relative: &str) -> RepoResult<()> {
        run_command(
            &self.path,
            GIT,
            &["rm", "-r", "-f", "-q", "--ignore-unmatch", "--", relative],
        )
        .await?;
        Ok(())
    }

    /// Stages every addition, modification and deletion under `relative`
    pub async fn add(&self, relative: &str) -> RepoResult<()> {
        run_command(&self.path, GIT, &["add", "-A", "--", relative]).await?;
        Ok(())
    }

    pub async fn has_staged_changes(&self) -> RepoResult<bool> {
        match run_command_code(&self.path, GIT, &["diff", "--cached", "--quiet"]).await? {
            0 => Ok(false),
            1 => Ok(true),
            code => Err(CommandError::NonZeroExitCode(code).into()),
        }
    }

    pub async fn commit(&self, message: &str) -> RepoResult<()> {
        run_command(&self.path, GIT, &["commit", "-q", "-m", message]).await?;
        Ok(())
    }
}

/// Checks whether the provided path contains a git directory. Linked
/// worktrees and submodules use a `.git` file instead
fn is_valid_git(path: impl AsRef<Path>) -> bool {
    path.as_ref().join(".git").exists()
}

/// Verifies that `repo` has nothing staged before files are copied
/// into or out of it. When git's answer can't be classified the raw
/// status is shown and the user decides, unless `assume_yes` is set
pub async fn check_repository(
    repo: &Repository,
    format: StatusFormat,
    assume_yes: bool,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> RepoResult<bool> {
    match repo.status(format).await? {
        RepoStatus::Clean => {
            info!("{} repository is clean", repo.name());
            Ok(true)
        }
        RepoStatus::Dirty => {
            error!(
                "Please make all commits to git in {}",
                repo.display_path().display()
            );
            Ok(false)
        }
        RepoStatus::Ambiguous(lines) => {
            writeln!(output, "git output in repository {}:", repo.path().display())?;
            writeln!(
                output,
                "If we attempt to copy widgets without a fully committed repository, there is a chance of data loss"
            )?;
            writeln!(output, "{}", lines.join("\n"))?;
            if assume_yes {
                warn!("Continuing with uncommitted changes in {}", repo.name());
                return Ok(true);
            }
            Ok(confirm(input, output, "Do you want to continue")?)
        }
    }
}
