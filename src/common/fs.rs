//! Atomic artifact replacement.
//!
//! Readers either see the previous artifact or the complete new one: payloads
//! go to a temp file in the destination directory which is then renamed over
//! the target. Staging and renaming are separate steps so a stage can prepare
//! several artifacts before publishing any of them.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::common::error::{RiskError, RiskResult};

/// A fully written artifact waiting next to its target. Dropping it discards
/// the temp file and leaves the target untouched.
#[derive(Debug)]
pub struct Staged {
    tmp: NamedTempFile,
    path: PathBuf,
}

impl Staged {
    /// Rename the staged file over its target.
    pub fn commit(self) -> RiskResult<()> {
        let Staged { tmp, path } = self;
        tmp.persist(&path)
            .map_err(|err| RiskError::io(&path, err.error))?;
        Ok(())
    }
}

/// Serialize `value` as pretty JSON into a synced temp file beside `path`.
pub fn stage_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> RiskResult<Staged> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|err| RiskError::io(dir, err))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|err| RiskError::io(dir, err))?;
    serde_json::to_writer_pretty(&mut tmp, value).map_err(|err| RiskError::json(path, err))?;
    tmp.write_all(b"\n").map_err(|err| RiskError::io(path, err))?;
    tmp.as_file()
        .sync_all()
        .map_err(|err| RiskError::io(path, err))?;
    Ok(Staged {
        tmp,
        path: path.to_path_buf(),
    })
}

/// Serialize `value` as pretty JSON and atomically replace `path`.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> RiskResult<()> {
    stage_json(path, value)?.commit()
}

/// Read a JSON artifact, mapping a missing file to `MissingArtifact`.
pub fn read_json<T: DeserializeOwned>(artifact: &'static str, path: &Path) -> RiskResult<T> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(RiskError::MissingArtifact {
                artifact,
                path: path.to_path_buf(),
            })
        }
        Err(err) => return Err(RiskError::io(path, err)),
    };
    serde_json::from_slice(&raw).map_err(|err| RiskError::json(path, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_existing_file_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");

        write_json_atomic(&path, &vec![1, 2, 3]).unwrap();
        write_json_atomic(&path, &vec![4]).unwrap();

        let back: Vec<i32> = read_json("test", &path).unwrap();
        assert_eq!(back, vec![4]);
        let leftovers = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn dropped_stage_leaves_target_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json_atomic(&path, &vec![1]).unwrap();

        let staged = stage_json(&path, &vec![2]).unwrap();
        let back: Vec<i32> = read_json("test", &path).unwrap();
        assert_eq!(back, vec![1]);
        drop(staged);

        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
        let back: Vec<i32> = read_json("test", &path).unwrap();
        assert_eq!(back, vec![1]);

        stage_json(&path, &vec![3]).unwrap().commit().unwrap();
        let back: Vec<i32> = read_json("test", &path).unwrap();
        assert_eq!(back, vec![3]);
    }

    #[test]
    fn missing_file_is_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_json::<Vec<i32>>("panel", &dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, RiskError::MissingArtifact { artifact: "panel", .. }));
    }
}
