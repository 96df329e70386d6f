/*!
High-level search space loading API.

Locates and reads a run's `search_space.json`, parsing it into a
[`SearchSpace`]. Every call re-reads the file; the engine deliberately keeps
no cross-request cache.
*/

use std::fs;
use std::io;
use std::path::Path;

use serde_json::Value;

use super::parser::{SearchSpace, SearchSpaceParser};
use crate::types::{EvoVisError, EvoVisResult};

/// Conventional search space file name inside a run directory
pub const SEARCH_SPACE_FILE: &str = "search_space.json";

/// Load the search space of a run from `<run_dir>/search_space.json`
pub fn load_search_space<P: AsRef<Path>>(run_dir: P) -> EvoVisResult<SearchSpace> {
    let path = run_dir.as_ref().join(SEARCH_SPACE_FILE);
    let json_str = fs::read_to_string(&path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            EvoVisError::ConfigNotFound(path.display().to_string())
        } else {
            EvoVisError::IoError(e.to_string())
        }
    })?;
    load_search_space_from_json(&json_str)
}

/// Parse a search space from a JSON string
pub fn load_search_space_from_json(json_str: &str) -> EvoVisResult<SearchSpace> {
    SearchSpaceParser::parse(json_str)
}

/// Read an arbitrary JSON file into a [`serde_json::Value`].
///
/// Shared by the run validation and result aggregation modules; a missing
/// file surfaces as [`EvoVisError::ConfigNotFound`].
pub(crate) fn read_json_value(path: &Path) -> EvoVisResult<Value> {
    let json_str = fs::read_to_string(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            EvoVisError::ConfigNotFound(path.display().to_string())
        } else {
            EvoVisError::IoError(e.to_string())
        }
    })?;
    Ok(serde_json::from_str(&json_str)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_search_space_from_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(SEARCH_SPACE_FILE),
            r#"{
                "gene_pool": {"G1": [{"layer": "A"}]},
                "rule_set": {"Start": ["A"]}
            }"#,
        )
        .unwrap();

        let space = load_search_space(dir.path()).unwrap();
        assert_eq!(space.gene_pool["G1"][0].layer, "A");
        assert_eq!(space.rule_set["Start"], vec!["A"]);
    }

    #[test]
    fn test_missing_file_is_config_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_search_space(dir.path());
        assert!(matches!(result, Err(EvoVisError::ConfigNotFound(_))));
    }
}
