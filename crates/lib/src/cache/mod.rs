//! Tagged reuse of the Node.js sub-build output.
//!
//! Building the runtime takes far longer than everything else, and its
//! output only depends on vendor, platform and architecture. The live output
//! directory carries a marker file with the tag it was built for; switching
//! to another tag moves the live output into the cache and moves the output
//! of the new tag (if it was built before) back in its place.
//!
//! # Layout
//!
//! ```text
//! <root>/node/out/j2v8.node.out      tag of the live output
//! <root>/node/{build,Release,Debug}  auxiliary output that travels with it
//! <root>/node.out/<tag>/out/...      cached output of other tags
//! <root>/node.out/untagged/...       live output found without a marker
//! ```
//!
//! Every filesystem failure is fatal. A half-finished move is not rolled back.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::consts::{
  NODE_CACHE_DIR, NODE_DIR, NODE_EXTRA_SUBDIRS, NODE_OUT_SUBDIR, NODE_TAG_FILE, NODE_UNTAGGED_ENTRY,
};
use crate::platform::{Arch, Os};

#[derive(Debug, Error)]
pub enum CacheError {
  #[error("failed to {action} {}: {source}", path.display())]
  Io {
    action: &'static str,
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

fn io_err(action: &'static str, path: &Path) -> impl FnOnce(io::Error) -> CacheError {
  let path = path.to_path_buf();
  move |source| CacheError::Io { action, path, source }
}

/// What [`ArtifactCache::reconcile`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheOutcome {
  /// The live output already had the desired tag.
  Hit,
  /// Output of the desired tag was moved back from the cache.
  Restored,
  /// No output for the desired tag exists; an empty tagged directory was prepared.
  Prepared,
  /// The live output was moved into the cache and nothing restored.
  Flushed,
}

/// `[vendor-]platform.arch`
pub fn cache_tag(vendor: Option<&str>, target: Os, arch: Arch) -> String {
  match vendor {
    Some(vendor) => format!("{vendor}-{target}.{arch}"),
    None => format!("{target}.{arch}"),
  }
}

#[derive(Debug, Clone)]
pub struct ArtifactCache {
  /// Directory holding the live output and its auxiliary directories.
  work_dir: PathBuf,
  cache_root: PathBuf,
  out_subdir: &'static str,
  extra_subdirs: &'static [&'static str],
  tag_file: &'static str,
}

impl ArtifactCache {
  pub fn new(work_dir: impl Into<PathBuf>, cache_root: impl Into<PathBuf>) -> Self {
    Self {
      work_dir: work_dir.into(),
      cache_root: cache_root.into(),
      out_subdir: NODE_OUT_SUBDIR,
      extra_subdirs: &NODE_EXTRA_SUBDIRS,
      tag_file: NODE_TAG_FILE,
    }
  }

  /// The runtime output cache of the project at `root`.
  pub fn for_project(root: &Path) -> Self {
    Self::new(root.join(NODE_DIR), root.join(NODE_CACHE_DIR))
  }

  /// Whether the directory the live output belongs in exists at all.
  pub fn is_present(&self) -> bool {
    self.work_dir.is_dir()
  }

  pub fn live_dir(&self) -> PathBuf {
    self.work_dir.join(self.out_subdir)
  }

  pub fn entry_dir(&self, tag: &str) -> PathBuf {
    self.cache_root.join(tag)
  }

  fn marker(&self) -> PathBuf {
    self.live_dir().join(self.tag_file)
  }

  fn subdirs(&self) -> impl Iterator<Item = &'static str> + '_ {
    std::iter::once(self.out_subdir).chain(self.extra_subdirs.iter().copied())
  }

  /// Tag recorded in the live output, if any.
  pub fn current_tag(&self) -> Result<Option<String>, CacheError> {
    let marker = self.marker();
    match fs::read_to_string(&marker) {
      Ok(tag) => {
        let tag = tag.trim();
        Ok((!tag.is_empty()).then(|| tag.to_string()))
      }
      Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(err) => Err(io_err("read", &marker)(err)),
    }
  }

  /// Make the live output belong to `desired`.
  ///
  /// With `desired` set to `None` the live output is only moved into the
  /// cache.
  pub fn reconcile(&self, desired: Option<&str>) -> Result<CacheOutcome, CacheError> {
    let current = self.current_tag()?;

    if let Some(tag) = desired
      && current.as_deref() == Some(tag)
    {
      debug!(tag, "runtime output already in place");
      return Ok(CacheOutcome::Hit);
    }

    match &current {
      Some(current) => self.stash(current)?,
      None if self.has_untagged_output() => {
        warn!(entry = NODE_UNTAGGED_ENTRY, "live runtime output has no tag, caching it aside");
        self.stash(NODE_UNTAGGED_ENTRY)?;
      }
      None => {}
    }

    let Some(desired) = desired else {
      return Ok(CacheOutcome::Flushed);
    };

    let entry = self.entry_dir(desired);
    if entry.join(self.out_subdir).is_dir() {
      self.restore(desired)?;
      return Ok(CacheOutcome::Restored);
    }

    let live = self.live_dir();
    fs::create_dir_all(&live).map_err(io_err("create", &live))?;
    let marker = self.marker();
    fs::write(&marker, desired).map_err(io_err("write", &marker))?;
    info!(tag = desired, "prepared empty runtime output");

    Ok(CacheOutcome::Prepared)
  }

  /// Move the live output into the cache without restoring anything.
  pub fn flush(&self) -> Result<CacheOutcome, CacheError> {
    self.reconcile(None)
  }

  /// Output without a marker, e.g. from a runtime built by hand.
  fn has_untagged_output(&self) -> bool {
    self.subdirs().any(|sub| {
      fs::read_dir(self.work_dir.join(sub))
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
    })
  }

  fn stash(&self, tag: &str) -> Result<(), CacheError> {
    let entry = self.entry_dir(tag);
    info!(tag, to = %entry.display(), "caching runtime output");

    if entry.exists() {
      fs::remove_dir_all(&entry).map_err(io_err("remove stale cache entry", &entry))?;
    }
    fs::create_dir_all(&entry).map_err(io_err("create", &entry))?;

    for sub in self.subdirs() {
      let from = self.work_dir.join(sub);
      if from.exists() {
        move_dir(&from, &entry.join(sub))?;
      }
    }
    Ok(())
  }

  fn restore(&self, tag: &str) -> Result<(), CacheError> {
    let entry = self.entry_dir(tag);
    info!(tag, from = %entry.display(), "restoring cached runtime output");

    for sub in self.subdirs() {
      let from = entry.join(sub);
      if !from.exists() {
        continue;
      }
      let to = self.work_dir.join(sub);
      if to.exists() {
        fs::remove_dir_all(&to).map_err(io_err("remove", &to))?;
      }
      move_dir(&from, &to)?;
    }

    fs::remove_dir_all(&entry).map_err(io_err("remove", &entry))
  }
}

/// Rename `from` to `to`, copying across filesystems when a rename cannot.
fn move_dir(from: &Path, to: &Path) -> Result<(), CacheError> {
  if let Some(parent) = to.parent() {
    fs::create_dir_all(parent).map_err(io_err("create", parent))?;
  }

  match fs::rename(from, to) {
    Ok(()) => Ok(()),
    Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
      debug!(from = %from.display(), to = %to.display(), "copying across devices");
      copy_dir(from, to)?;
      fs::remove_dir_all(from).map_err(io_err("remove", from))
    }
    Err(err) => Err(io_err("move", from)(err)),
  }
}

fn copy_dir(from: &Path, to: &Path) -> Result<(), CacheError> {
  for entry in WalkDir::new(from) {
    let entry = entry.map_err(|err| {
      let path = err.path().unwrap_or(from).to_path_buf();
      CacheError::Io {
        action: "read",
        path,
        source: err.into(),
      }
    })?;

    let Ok(relative) = entry.path().strip_prefix(from) else {
      continue;
    };
    let dest = to.join(relative);

    if entry.file_type().is_dir() {
      fs::create_dir_all(&dest).map_err(io_err("create", &dest))?;
    } else {
      fs::copy(entry.path(), &dest).map_err(io_err("copy", entry.path()))?;
    }
  }
  Ok(())
}
