//! Artifact persistence.
//!
//! The artifact is written pretty-printed to a sibling temp file and renamed
//! over the target, so readers never observe a half-written document.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{PipelineError, Result};
use crate::types::artifact::RunArtifact;

/// Conventional artifact location, relative to the working directory.
pub const DEFAULT_ARTIFACT_PATH: &str = "data/grants.json";

fn write_err(path: &Path) -> impl FnOnce(std::io::Error) -> PipelineError + '_ {
    move |source| PipelineError::Write {
        path: path.to_path_buf(),
        source,
    }
}

/// Serialize the artifact the way it is stored on disk.
pub fn to_pretty_json(artifact: &RunArtifact) -> Result<String> {
    let mut json = serde_json::to_string_pretty(artifact)?;
    json.push('\n');
    Ok(json)
}

/// Write the artifact, replacing whatever was at `path`.
pub fn write_artifact(path: impl AsRef<Path>, artifact: &RunArtifact) -> Result<()> {
    let path = path.as_ref();
    let json = to_pretty_json(artifact)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err(path))?;
    }

    let tmp = temp_path(path);
    fs::write(&tmp, json).map_err(write_err(path))?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(write_err(path)(e));
    }

    info!(path = %path.display(), count = artifact.count, "Artifact written");
    Ok(())
}

/// Read a previously written artifact.
pub fn read_artifact(path: impl AsRef<Path>) -> Result<RunArtifact> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| PipelineError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::aggregate::assemble;
    use crate::pipeline::canonical::assign_id;
    use crate::testing::listing;

    #[test]
    fn test_write_creates_parent_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("grants.json");

        let first = assemble(vec![assign_id(listing("A", "https://x/1", "s", None))], &[]);
        write_artifact(&path, &first).unwrap();

        let second = assemble(vec![], &[]);
        write_artifact(&path, &second).unwrap();

        let read = read_artifact(&path).unwrap();
        assert_eq!(read.count, 0);
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_pretty_printed_utf8() {
        let artifact = assemble(
            vec![assign_id(listing("Subvención café", "https://x/1", "s", None))],
            &[],
        );
        let json = to_pretty_json(&artifact).unwrap();
        assert!(json.contains("Subvención café"));
        assert!(json.contains("\n  \"count\": 1"));
    }

    #[test]
    fn test_write_into_missing_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a dir").unwrap();

        let err = write_artifact(blocker.join("grants.json"), &assemble(vec![], &[])).unwrap_err();
        assert!(matches!(err, PipelineError::Write { .. }));
    }
}
