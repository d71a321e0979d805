//! Trigger evaluation: should this event start a release run?
//!
//! A run proceeds on manual dispatch, on an external pipeline call, or on a
//! push of a tag matching one of the configured globs. Anything else is a
//! silent skip, never an error.

use crate::core::error::ShipResult;
use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use std::fmt;

const TAG_PREFIX: &str = "refs/tags/";
const BRANCH_PREFIX: &str = "refs/heads/";

/// Overrides `GITHUB_EVENT_NAME`. Reusable workflows see the caller's event
/// there, so a called pipeline sets this to `workflow_call`.
pub const EVENT_OVERRIDE_VAR: &str = "SHIPMATRIX_EVENT";

/// `*` and `?` stop at `/`, like CI tag filters
const TAG_MATCH: MatchOptions = MatchOptions {
  case_sensitive: true,
  require_literal_separator: true,
  require_literal_leading_dot: false,
};

/// Event that may start a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
  /// Manual dispatch (also any local invocation without CI metadata)
  WorkflowDispatch,
  /// Invoked by another pipeline
  WorkflowCall,
  /// Push of a git ref
  Push { git_ref: String },
  /// Anything else (pull_request, schedule, ...)
  Other { name: String },
}

impl Event {
  /// Build an event from CI-style names (`workflow_dispatch`, `workflow_call`, `push`, ...)
  pub fn from_parts(name: &str, git_ref: Option<&str>) -> Self {
    match name {
      "workflow_dispatch" | "manual" | "dispatch" => Event::WorkflowDispatch,
      "workflow_call" | "call" => Event::WorkflowCall,
      "push" => Event::Push {
        git_ref: git_ref.unwrap_or_default().to_string(),
      },
      other => Event::Other { name: other.to_string() },
    }
  }

  /// Read the CI environment; no CI metadata means a manual dispatch
  pub fn from_env() -> Self {
    Self::from_vars(|name| std::env::var(name).ok())
  }

  /// `SHIPMATRIX_EVENT` wins over `GITHUB_EVENT_NAME`; the ref comes from `GITHUB_REF`
  pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
    let git_ref = lookup("GITHUB_REF");
    let name = [EVENT_OVERRIDE_VAR, "GITHUB_EVENT_NAME"]
      .into_iter()
      .filter_map(|var| lookup(var))
      .find(|name| !name.is_empty());
    match name {
      Some(name) => Self::from_parts(&name, git_ref.as_deref()),
      None => Event::WorkflowDispatch,
    }
  }

  /// Tag name carried by the event's ref, if it names a tag
  pub fn tag(&self) -> Option<&str> {
    match self {
      Event::Push { git_ref } => tag_from_ref(git_ref),
      _ => None,
    }
  }
}

impl fmt::Display for Event {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Event::WorkflowDispatch => write!(f, "workflow_dispatch"),
      Event::WorkflowCall => write!(f, "workflow_call"),
      Event::Push { git_ref } => write!(f, "push ({})", git_ref),
      Event::Other { name } => write!(f, "{}", name),
    }
  }
}

/// `refs/tags/v1.2.3` → `v1.2.3`; a bare name is treated as a tag; branch refs are not tags
pub fn tag_from_ref(git_ref: &str) -> Option<&str> {
  if let Some(tag) = git_ref.strip_prefix(TAG_PREFIX) {
    return (!tag.is_empty()).then_some(tag);
  }
  if git_ref.is_empty() || git_ref.starts_with(BRANCH_PREFIX) || git_ref.starts_with("refs/") {
    return None;
  }
  Some(git_ref)
}

/// Result of evaluating an event against the trigger rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDecision {
  pub proceed: bool,
  pub reason: String,
  /// Tag carried by the event (tag pushes only)
  pub tag: Option<String>,
}

impl TriggerDecision {
  fn proceed(reason: impl Into<String>, tag: Option<String>) -> Self {
    Self {
      proceed: true,
      reason: reason.into(),
      tag,
    }
  }

  fn skip(reason: impl Into<String>) -> Self {
    Self {
      proceed: false,
      reason: reason.into(),
      tag: None,
    }
  }
}

/// Tag globs that gate push-triggered runs
#[derive(Debug, Clone)]
pub struct TriggerRule {
  patterns: Vec<Pattern>,
}

impl TriggerRule {
  pub fn new<S: AsRef<str>>(patterns: &[S]) -> ShipResult<Self> {
    let patterns = patterns
      .iter()
      .map(|p| Pattern::new(p.as_ref()))
      .collect::<Result<Vec<_>, _>>()?;
    Ok(Self { patterns })
  }

  pub fn matches_tag(&self, tag: &str) -> bool {
    self.patterns.iter().any(|p| p.matches_with(tag, TAG_MATCH))
  }

  pub fn evaluate(&self, event: &Event) -> TriggerDecision {
    match event {
      Event::WorkflowDispatch => TriggerDecision::proceed("manual dispatch", None),
      Event::WorkflowCall => TriggerDecision::proceed("called by another pipeline", None),
      Event::Push { git_ref } => match event.tag() {
        Some(tag) if self.matches_tag(tag) => {
          TriggerDecision::proceed(format!("tag push {}", tag), Some(tag.to_string()))
        }
        Some(tag) => TriggerDecision::skip(format!("tag {} does not match {}", tag, self.describe())),
        None => TriggerDecision::skip(format!("push of {} is not a tag", git_ref)),
      },
      Event::Other { name } => TriggerDecision::skip(format!("event '{}' does not trigger releases", name)),
    }
  }

  fn describe(&self) -> String {
    self
      .patterns
      .iter()
      .map(|p| p.as_str())
      .collect::<Vec<_>>()
      .join(", ")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn rule() -> TriggerRule {
    TriggerRule::new(&["v*"]).unwrap()
  }

  fn push(git_ref: &str) -> Event {
    Event::Push {
      git_ref: git_ref.to_string(),
    }
  }

  #[test]
  fn test_tag_push_matching_pattern_proceeds() {
    let decision = rule().evaluate(&push("refs/tags/v1.2.3"));
    assert!(decision.proceed);
    assert_eq!(decision.tag.as_deref(), Some("v1.2.3"));
  }

  #[test]
  fn test_other_pushes_skip() {
    assert!(!rule().evaluate(&push("refs/tags/release-1")).proceed);
    assert!(!rule().evaluate(&push("refs/heads/main")).proceed);
    assert!(!rule().evaluate(&push("refs/heads/v2-branch")).proceed);
    assert!(!rule().evaluate(&push("")).proceed);
  }

  #[test]
  fn test_manual_and_call_always_proceed() {
    assert!(rule().evaluate(&Event::WorkflowDispatch).proceed);
    assert!(rule().evaluate(&Event::WorkflowCall).proceed);
    assert!(rule().evaluate(&Event::WorkflowDispatch).tag.is_none());
  }

  #[test]
  fn test_unrelated_events_skip() {
    let decision = rule().evaluate(&Event::from_parts("pull_request", Some("refs/pull/1/merge")));
    assert!(!decision.proceed);
    assert!(decision.reason.contains("pull_request"));
  }

  #[test]
  fn test_bare_ref_is_a_tag() {
    assert_eq!(tag_from_ref("v0.1.0"), Some("v0.1.0"));
    assert_eq!(tag_from_ref("refs/tags/"), None);
    assert_eq!(tag_from_ref("refs/pull/3/head"), None);
    assert!(rule().evaluate(&Event::from_parts("push", Some("v0.1.0"))).proceed);
  }

  #[test]
  fn test_multiple_patterns() {
    let rule = TriggerRule::new(&["v*", "release-[0-9]*"]).unwrap();
    assert!(rule.matches_tag("release-2024"));
    assert!(!rule.matches_tag("release-x"));
    assert!(TriggerRule::new(&["v["]).is_err());
  }

  #[test]
  fn test_star_does_not_cross_slash() {
    let decision = rule().evaluate(&push("refs/tags/v1/hotfix"));
    assert!(!decision.proceed);
    assert!(decision.reason.contains("v1/hotfix"));

    let nested = TriggerRule::new(&["v*/*"]).unwrap();
    assert!(nested.matches_tag("v1/hotfix"));
    assert!(!nested.matches_tag("v1.0.0"));
  }

  #[test]
  fn test_event_from_vars() {
    fn vars(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
      move |name| pairs.iter().find(|(k, _)| *k == name).map(|(_, v)| v.to_string())
    }

    assert_eq!(Event::from_vars(vars(&[])), Event::WorkflowDispatch);
    assert_eq!(
      Event::from_vars(vars(&[("GITHUB_EVENT_NAME", "push"), ("GITHUB_REF", "refs/tags/v1.0.0")])),
      push("refs/tags/v1.0.0")
    );
    // A called pipeline inherits the caller's event name
    assert_eq!(
      Event::from_vars(vars(&[
        ("GITHUB_EVENT_NAME", "push"),
        ("GITHUB_REF", "refs/heads/main"),
        ("SHIPMATRIX_EVENT", "workflow_call"),
      ])),
      Event::WorkflowCall
    );
    assert_eq!(
      Event::from_vars(vars(&[("GITHUB_EVENT_NAME", "schedule"), ("SHIPMATRIX_EVENT", "")])),
      Event::Other {
        name: "schedule".to_string()
      }
    );
  }
}
