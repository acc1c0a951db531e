use async_walkdir::WalkDir;
use futures::StreamExt;
use log::{debug, info};
use std::io;
use std::path::Path;
use tokio::fs::{copy, create_dir_all, remove_dir_all, remove_file};

/// Safely creates a directory ensuring that if a non directory
/// exists at the path its removed and the directory is created
pub async fn create_directory(path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    if path.exists() {
        if !path.is_dir() {
            remove_file(path).await?;
            create_dir_all(path).await?;
        }
    } else {
        create_dir_all(path).await?;
    }
    Ok(())
}

/// Removes any existing files or directories at the provided
/// path asynchronously
pub async fn remove_existing(path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    let metadata = match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };
    if metadata.is_dir() {
        remove_dir_all(path).await?;
    } else {
        remove_file(path).await?;
    }
    Ok(())
}

/// Number of entries written by [`copy_tree`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CopyStats {
    pub files: usize,
    pub directories: usize,
    pub symlinks: usize,
}

/// Recursively copies the directory `src` to `dest`. The destination
/// is created if missing, existing files are overwritten and nothing
/// is ever removed from it
pub async fn copy_tree(src: impl AsRef<Path>, dest: impl AsRef<Path>) -> io::Result<CopyStats> {
    let src = src.as_ref();
    let dest = dest.as_ref();

    if !src.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("source directory {} does not exist", src.display()),
        ));
    }

    create_dir_all(dest).await?;
    let mut stats = CopyStats {
        directories: 1,
        ..CopyStats::default()
    };

    let mut entries = WalkDir::new(src);
    while let Some(entry) = entries.next().await {
        let entry = entry?;
        let path = entry.path();
        let relative = path
            .strip_prefix(src)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let target = dest.join(relative);
        let file_type = entry.file_type().await?;

        if file_type.is_dir() {
            create_dir_all(&target).await?;
            stats.directories += 1;
            continue;
        }

        if let Some(parent) = target.parent() {
            create_dir_all(parent).await?;
        }

        if file_type.is_symlink() {
            copy_symlink(&path, &target).await?;
            stats.symlinks += 1;
        } else {
            debug!("Copying {} -> {}", path.display(), target.display());
            copy(&path, &target).await?;
            stats.files += 1;
        }
    }

    info!(
        "Copied {} files and {} directories from {} to {}",
        stats.files,
        stats.directories,
        src.display(),
        dest.display()
    );
    Ok(stats)
}

#[cfg(unix)]
async fn copy_symlink(path: &Path, target: &Path) -> io::Result<()> {
    let link = tokio::fs::read_link(path).await?;
    remove_existing(target).await?;
    tokio::fs::symlink(link, target).await
}

#[cfg(not(unix))]
async fn copy_symlink(path: &Path, target: &Path) -> io::Result<()> {
    copy(path, target).await.map(|_| ())
}
