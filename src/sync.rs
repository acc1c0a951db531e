use crate::config::{Config, ConfigError, RemovalOrder, TAG_PLACEHOLDER};
use crate::fs::{copy_tree, create_directory, remove_existing, CopyStats};
use crate::git::{check_repository, Repository, RepositoryError};
use crate::tag::{commit_tag, TagError};
use derive_more::{Display, From};
use log::{error, info};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Debug, From, Display)]
pub enum SyncError {
    #[display(fmt = "{}", _0)]
    Config(ConfigError),
    #[display(fmt = "{}", _0)]
    Repository(RepositoryError),
    #[display(fmt = "Unable to read the widgets commit tag: {}", _0)]
    Tag(TagError),
    #[display(fmt = "IO Error occurred while copying widgets: {}", _0)]
    IO(io::Error),
    #[display(fmt = "Widget directory {:?} does not exist", _0)]
    #[from(ignore)]
    MissingSource(PathBuf),
}

pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Default, Clone, Copy)]
pub struct SyncOptions {
    /// Continue without asking when a repository status is ambiguous
    pub assume_yes: bool,
    /// Stop after the checks and tag lookup, touching nothing
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Committed {
        tag: String,
        message: String,
        stats: CopyStats,
    },
    /// The copied widgets are identical to what is already committed
    UpToDate { tag: String },
    /// A repository had staged changes or the user declined to continue
    Aborted,
    DryRun { tag: String, message: String },
}

pub fn commit_message(template: &str, tag: &str) -> String {
    template.replace(TAG_PLACEHOLDER, tag)
}

/// Copies every configured widget directory from the widgets
/// repository into the destination repository and commits the result
/// tagged with the widgets commit
pub async fn synchronize(
    config: &Config,
    options: SyncOptions,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> SyncResult<SyncOutcome> {
    config.validate()?;

    let widgets = Repository::open("widgets", &config.widgets_repo)?;
    let destination = Repository::open("destination", &config.destination_repo)?;

    let format = config.status_format;
    let proceed = check_repository(&widgets, format, options.assume_yes, input, output).await?
        && check_repository(&destination, format, options.assume_yes, input, output).await?;
    if !proceed {
        error!("Please commit both your git repositories!");
        return Ok(SyncOutcome::Aborted);
    }

    let tag = commit_tag(widgets.path(), config.tag_command.as_deref()).await?;
    let message = commit_message(&config.commit_message, &tag);

    // Nothing is deleted until every source is known to exist
    for mapping in &config.mappings {
        let source = widgets.path().join(&mapping.source);
        if !source.is_dir() {
            return Err(SyncError::MissingSource(source));
        }
    }

    if options.dry_run {
        for mapping in &config.mappings {
            info!(
                "Would replace {} with {}",
                destination.path().join(&mapping.destination).display(),
                widgets.path().join(&mapping.source).display()
            );
        }
        info!("Would commit \"{message}\"");
        return Ok(SyncOutcome::DryRun { tag, message });
    }

    let mut stats = CopyStats::default();
    for mapping in &config.mappings {
        let source = widgets.path().join(&mapping.source);
        let target = destination.path().join(&mapping.destination);

        match config.removal_order {
            RemovalOrder::DeleteThenUnstage => {
                remove_existing(&target).await?;
                destination.remove_tracked(&mapping.destination).await?;
            }
            RemovalOrder::UnstageThenDelete => {
                destination.remove_tracked(&mapping.destination).await?;
                remove_existing(&target).await?;
            }
        }

        if let Some(parent) = target.parent() {
            create_directory(parent).await?;
        }
        let copied = copy_tree(&source, &target).await?;
        stats.files += copied.files;
        stats.directories += copied.directories;
        stats.symlinks += copied.symlinks;
    }

    for mapping in &config.mappings {
        destination.add(&mapping.destination).await?;
    }

    if !destination.has_staged_changes().await? {
        info!("Destination already matches widgets commit {tag}, nothing to commit");
        return Ok(SyncOutcome::UpToDate { tag });
    }

    destination.commit(&message).await?;
    info!("Committed \"{message}\" in {}", destination.path().display());
    Ok(SyncOutcome::Committed {
        tag,
        message,
        stats,
    })
}
