//! Repository file persistence (spec §4.7 `UpdateRepository`, §6).

use std::path::PathBuf;

use sha2::{Digest, Sha256};

use meridian_types::EndpointName;

use crate::error::{ClusterError, Result};

/// `<stateDir>/lib/<product>/api/repository/<sha256-hex(endpointName)>.repo`.
pub fn repository_path(repository_dir: &std::path::Path, endpoint: &EndpointName) -> PathBuf {
    let digest = Sha256::digest(endpoint.as_str().as_bytes());
    repository_dir.join(format!("{:x}.repo", digest))
}

/// Persists `params` atomically (temp file + rename) for the given
/// endpoint, creating the repository directory if needed.
pub fn write_repository(
    repository_dir: &std::path::Path,
    endpoint: &EndpointName,
    params: &serde_json::Value,
) -> Result<()> {
    std::fs::create_dir_all(repository_dir).map_err(|source| ClusterError::Io {
        path: repository_dir.to_path_buf(),
        source,
    })?;
    let path = repository_path(repository_dir, endpoint);
    let mut temp_path = path.clone().into_os_string();
    temp_path.push(".tmp");
    let temp_path = PathBuf::from(temp_path);

    let body = serde_json::to_vec(params).expect("serde_json::Value always serializes");
    std::fs::write(&temp_path, body).map_err(|source| ClusterError::Io {
        path: temp_path.clone(),
        source,
    })?;
    std::fs::rename(&temp_path, &path).map_err(|source| ClusterError::Rename {
        temp_path,
        path,
        source,
    })
}
