//! # Report Module
//!
//! Persists the final research result as pretty-printed JSON, one file per
//! topic.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::ResearchError;
use crate::research::ResearchState;

/// Longest file stem derived from a topic.
const MAX_STEM_CHARS: usize = 50;

/// File stem for `topic`: lowercased, anything outside `[a-z0-9_-]`
/// replaced by `_`, capped at 50 characters.
pub fn safe_file_stem(topic: &str) -> String {
    topic
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_STEM_CHARS)
        .collect()
}

/// Write `state` to `<dir>/<safe topic>.json`, creating `dir` if needed.
pub fn save_report(dir: &Path, topic: &str, state: &ResearchState) -> Result<PathBuf, ResearchError> {
    fs::create_dir_all(dir)
        .map_err(|e| ResearchError::Report(format!("cannot create {}: {}", dir.display(), e)))?;

    let path = dir.join(format!("{}.json", safe_file_stem(topic)));
    let json = serde_json::to_string_pretty(state)
        .map_err(|e| ResearchError::Report(e.to_string()))?;
    fs::write(&path, json)
        .map_err(|e| ResearchError::Report(format!("cannot write {}: {}", path.display(), e)))?;

    info!(path = %path.display(), "Report saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_file_stem() {
        assert_eq!(
            safe_file_stem("make a report on the state of ai agents"),
            "make_a_report_on_the_state_of_ai_agents"
        );
        assert_eq!(safe_file_stem("Rust/Async: 2024?"), "rust_async__2024_");
        assert_eq!(safe_file_stem("keep-dashes_and_underscores"), "keep-dashes_and_underscores");
    }

    #[test]
    fn test_safe_file_stem_is_capped() {
        let stem = safe_file_stem(&"x".repeat(80));
        assert_eq!(stem.len(), 50);
    }

    #[test]
    fn test_save_report_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let reports = dir.path().join("reports");
        let state = ResearchState::new(["L1", "L2"], ["https://u1"]);

        let path = save_report(&reports, "My Topic", &state).unwrap();

        assert_eq!(path, reports.join("my_topic.json"));
        let written: ResearchState =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, state);
    }
}
