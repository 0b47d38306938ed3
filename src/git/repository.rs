//! Git Repository Reads
//!
//! Loads note collections from committed trees without touching the worktree.

use std::path::Path;

use git2::{ObjectType, Repository};

use crate::deck::Deck;
use crate::loader::{Collection, LoaderError};

/// Git operation errors
#[derive(Debug, thiserror::Error)]
pub enum GitOperationError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),
    #[error("Repository not initialized")]
    NotInitialized,
    #[error("Not a directory: {0}")]
    NotATree(String),
    #[error("File is not valid UTF-8: {0}")]
    InvalidUtf8(String),
    #[error("Definition error: {0}")]
    Loader(#[from] LoaderError),
}

pub type Result<T> = std::result::Result<T, GitOperationError>;

/// Open an existing Git repository
pub fn open_repo(path: &Path) -> Result<Repository> {
    Repository::open(path).map_err(|e| {
        if e.code() == git2::ErrorCode::NotFound {
            GitOperationError::NotInitialized
        } else {
            GitOperationError::Git(e)
        }
    })
}

/// Read every `*.toml` blob directly under `data_dir` at `rev`, as
/// `(path, contents)` pairs in tree order
pub fn read_definition_sources(repo: &Repository, rev: &str, data_dir: &str) -> Result<Vec<(String, String)>> {
    let treeish = format!("{}:{}", rev, data_dir);
    let object = repo.revparse_single(&treeish)?;
    let tree = object
        .as_tree()
        .ok_or_else(|| GitOperationError::NotATree(treeish.clone()))?;

    let mut sources = Vec::new();
    for entry in tree.iter() {
        let Some(name) = entry.name() else { continue };
        if entry.kind() != Some(ObjectType::Blob) || !name.ends_with(".toml") {
            continue;
        }

        let origin = format!("{}/{}", treeish, name);
        let blob = repo.find_blob(entry.id())?;
        let content = std::str::from_utf8(blob.content())
            .map_err(|_| GitOperationError::InvalidUtf8(origin.clone()))?;
        sources.push((origin, content.to_string()));
    }

    log::debug!("Found {} definition files at {}", sources.len(), treeish);
    Ok(sources)
}

/// Load the collection defined at `rev`
pub fn load_collection_at(repo: &Repository, rev: &str, data_dir: &str) -> Result<Collection> {
    let sources = read_definition_sources(repo, rev, data_dir)?;
    Ok(Collection::from_sources(sources)?)
}

/// Notes at a release revision plus the notes removed since a base revision
#[derive(Debug, Clone)]
pub struct RevisionDiff {
    pub release: Collection,
    pub removed: Collection,
}

impl RevisionDiff {
    /// Add release notes, then removed notes, to `deck`
    pub fn into_deck(self, mut deck: Deck) -> Deck {
        self.release.add_to_deck(&mut deck);
        self.removed.add_to_deck(&mut deck);
        deck
    }
}

/// Compare the collections at `base` and `release` and tag every note that
/// disappeared with `removed_tag`
pub fn diff_revisions(
    path: &Path,
    base: &str,
    release: &str,
    data_dir: &str,
    removed_tag: &str,
) -> Result<RevisionDiff> {
    let repo = open_repo(path)?;

    let base_notes = load_collection_at(&repo, base, data_dir)?;
    let release_notes = load_collection_at(&repo, release, data_dir)?;

    let mut removed = base_notes.minus(&release_notes);
    removed.tag_all(removed_tag);

    log::info!(
        "Base {} has {} notes, release {} has {} notes, {} removed",
        base,
        base_notes.len(),
        release,
        release_notes.len(),
        removed.len()
    );

    Ok(RevisionDiff {
        release: release_notes,
        removed,
    })
}
