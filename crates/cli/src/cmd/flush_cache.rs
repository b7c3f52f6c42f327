use anyhow::{Context, Result};

use j2v8build_lib::cache::ArtifactCache;
use j2v8build_lib::settings::Settings;

use crate::output::{print_info, print_success};

/// Move the live Node.js output into the cache without restoring anything.
pub fn cmd_flush_cache() -> Result<()> {
  let settings = Settings::from_env().context("Failed to determine the project root")?;
  let cache = ArtifactCache::for_project(settings.project_root());

  if !cache.is_present() {
    print_info("No Node.js checkout found, nothing to flush");
    return Ok(());
  }

  let tag = cache.current_tag().context("Failed to read the Node.js output tag")?;
  cache.flush().context("Failed to flush the Node.js output")?;

  match tag {
    Some(tag) => print_success(&format!("Cached Node.js output for {tag}")),
    None => print_success("Node.js output flushed"),
  }
  Ok(())
}
