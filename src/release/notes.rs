//! Release notes from a Keep-a-Changelog style file

use crate::core::error::{ResultExt, ShipResult};
use std::path::Path;

/// Notes for `tag` read from `changelog`. A missing file or section yields empty notes.
pub fn notes_for_tag(changelog: &Path, tag: &str) -> ShipResult<String> {
  if !changelog.exists() {
    return Ok(String::new());
  }
  let content = std::fs::read_to_string(changelog)
    .with_context(|| format!("Failed to read changelog {}", changelog.display()))?;
  let version = tag.strip_prefix('v').unwrap_or(tag);
  Ok(extract_notes(&content, version).unwrap_or_default())
}

/// Body of the `## <version>` section.
///
/// Accepted headings: `## 1.2.3`, `## v1.2.3`, `## [1.2.3]`, `## [1.2.3] - 2024-01-01`.
/// The section ends at the next heading of level 2 or higher.
pub fn extract_notes(changelog: &str, version: &str) -> Option<String> {
  let mut lines = changelog.lines();
  lines.find(|line| heading_version(line).is_some_and(|v| v == version))?;

  let body: Vec<&str> = lines.take_while(|line| !is_section_boundary(line)).collect();
  Some(body.join("\n").trim().to_string())
}

fn is_section_boundary(line: &str) -> bool {
  line.starts_with("## ") || line.starts_with("# ")
}

fn heading_version(line: &str) -> Option<&str> {
  let rest = line.strip_prefix("## ")?.trim();
  let token = rest.split_whitespace().next()?;
  let token = token.trim_start_matches('[');
  let token = token.split(']').next()?;
  Some(token.strip_prefix('v').unwrap_or(token))
}
