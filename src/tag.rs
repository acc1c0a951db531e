use crate::cmd::{run_command_output, split_command, CommandError};
use derive_more::{Display, From};
use log::info;
use std::path::{Path, PathBuf};

#[derive(Debug, From, Display)]
pub enum TagError {
    #[display(fmt = "Unable to run the tag command: {}", _0)]
    Command(CommandError),
    #[display(fmt = "Tag command printed no tag")]
    #[from(ignore)]
    Empty,
}

pub type TagResult<T> = Result<T, TagError>;

/// Used when no tag command is configured
pub const DEFAULT_TAG_COMMAND: &str = "git rev-parse --short HEAD";

/// Runs the tag command inside `repo_dir` and returns the first line
/// it prints, trimmed
pub async fn commit_tag(repo_dir: impl AsRef<Path>, tag_command: Option<&str>) -> TagResult<String> {
    let tag_command = tag_command.unwrap_or(DEFAULT_TAG_COMMAND);
    let (program, args) = split_command(tag_command).ok_or(CommandError::MissingCommand)?;

    let repo_dir = repo_dir.as_ref();
    let program = resolve_program(repo_dir, program);

    let output = run_command_output(repo_dir, &program, &args).await?;
    let tag = first_line(&output).ok_or(TagError::Empty)?;
    info!("Widgets are at commit {tag}");
    Ok(tag.to_string())
}

/// Programs given as a relative path (`./getCommitTag.pl`) live in the
/// widgets repository, bare names are looked up on the PATH
fn resolve_program(repo_dir: &Path, program: &str) -> PathBuf {
    let path = Path::new(program);
    if path.is_relative() && path.components().count() > 1 {
        let joined = repo_dir.join(path);
        return joined.canonicalize().unwrap_or(joined);
    }
    PathBuf::from(program)
}

fn first_line(output: &str) -> Option<&str> {
    let line = output.lines().next()?.trim();
    if line.is_empty() {
        None
    } else {
        Some(line)
    }
}

#[cfg(test)]
mod test {
    use crate::cmd::CommandError;
    use crate::git::test::{init_logger, init_repo};
    use crate::tag::{commit_tag, first_line, resolve_program, TagError};
    use std::path::{Path, PathBuf};

    #[test]
    fn first_line_is_trimmed() {
        assert_eq!(first_line("  a1b2c3d \nsecond\n"), Some("a1b2c3d"));
        assert_eq!(first_line("abc"), Some("abc"));
        assert_eq!(first_line(""), None);
        assert_eq!(first_line("\nlater"), None);
    }

    #[test]
    fn relative_programs_resolve_against_repository() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("getCommitTag.pl"), "").unwrap();
        let resolved = resolve_program(root.path(), "./getCommitTag.pl");
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("getCommitTag.pl"));

        assert_eq!(resolve_program(Path::new("/repo"), "git"), PathBuf::from("git"));
        assert_eq!(
            resolve_program(Path::new("/repo"), "/usr/bin/tag"),
            PathBuf::from("/usr/bin/tag")
        );
    }

    #[tokio::test]
    async fn default_command_reads_head() {
        init_logger();
        let root = tempfile::tempdir().unwrap();
        init_repo(root.path());
        let tag = commit_tag(root.path(), None).await.unwrap();
        assert!(tag.len() >= 4);
        assert!(tag.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn custom_command_output() {
        let root = tempfile::tempdir().unwrap();
        let tag = commit_tag(root.path(), Some("echo deadbeef extra")).await.unwrap();
        assert_eq!(tag, "deadbeef extra");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failures_are_reported() {
        let root = tempfile::tempdir().unwrap();
        assert!(matches!(
            commit_tag(root.path(), Some("true")).await,
            Err(TagError::Empty)
        ));
        assert!(matches!(
            commit_tag(root.path(), Some("false")).await,
            Err(TagError::Command(CommandError::NonZeroExitCode(1)))
        ));
        assert!(matches!(
            commit_tag(root.path(), Some("   ")).await,
            Err(TagError::Command(CommandError::MissingCommand))
        ));
    }
}
