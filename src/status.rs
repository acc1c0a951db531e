use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Classification of a repository's `git status` output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoStatus {
    /// Nothing staged or changed, safe to continue
    Clean,
    /// Changes are staged but not committed
    Dirty,
    /// Neither case could be recognised. Holds the raw status lines
    Ambiguous(Vec<String>),
}

/// Which flavour of `git status` output is requested and classified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFormat {
    /// `git status --porcelain`
    #[default]
    Porcelain,
    /// Human readable `git status`
    Text,
}

impl StatusFormat {
    pub fn git_args(self) -> &'static [&'static str] {
        match self {
            StatusFormat::Porcelain => &["status", "--porcelain"],
            StatusFormat::Text => &["status"],
        }
    }

    pub fn classify(self, output: &str) -> RepoStatus {
        match self {
            StatusFormat::Porcelain => classify_porcelain(output),
            StatusFormat::Text => classify_text(output),
        }
    }
}

const STAGED_MARKER: &str = "Changes to be committed";
const CLEAN_MARKER: &str = "nothing to commit";

/// Classifies the human readable output of `git status`. The first
/// line carrying one of the known phrases decides the result
pub fn classify_text(output: &str) -> RepoStatus {
    let lines: Vec<&str> = output.split('\n').collect();
    for line in &lines {
        if line.contains(STAGED_MARKER) {
            return RepoStatus::Dirty;
        }
        if line.contains(CLEAN_MARKER) {
            return RepoStatus::Clean;
        }
    }
    RepoStatus::Ambiguous(lines.into_iter().map(String::from).collect())
}

lazy_static! {
    static ref PORCELAIN_LINE: Regex =
        Regex::new(r"^([ MADRCUT?!])([ MADRCUT?!]) (.+)$").expect("valid porcelain regex");
}

/// Classifies `git status --porcelain` output. Anything staged in the
/// index is dirty, an empty status is clean and everything else
/// (worktree edits, untracked files, unknown lines) needs a human
pub fn classify_porcelain(output: &str) -> RepoStatus {
    let lines: Vec<&str> = output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return RepoStatus::Clean;
    }

    let staged = lines.iter().any(|line| {
        PORCELAIN_LINE
            .captures(line)
            .and_then(|captures| captures.get(1))
            .map(|index| !matches!(index.as_str(), " " | "?" | "!"))
            .unwrap_or(false)
    });

    if staged {
        RepoStatus::Dirty
    } else {
        RepoStatus::Ambiguous(lines.into_iter().map(String::from).collect())
    }
}
