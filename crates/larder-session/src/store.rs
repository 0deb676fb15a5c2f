//! Loading and saving the session store file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::entry::SessionStore;
use crate::error::{Error, Result};

/// Read the store at `path`. A missing file is an empty store.
pub async fn load_store(path: &Path) -> Result<SessionStore> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "No session store file, starting empty");
            return Ok(SessionStore::new());
        }
        Err(e) => return Err(Error::io(path, e)),
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(SessionStore::new());
    }

    let store: SessionStore = serde_json::from_slice(&bytes).map_err(|e| Error::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;

    debug!(path = %path.display(), entries = store.len(), "Loaded session store");
    Ok(store)
}

/// Write the store to `path`, replacing any existing file.
///
/// The JSON is written to a sibling temp file first and renamed into place,
/// so readers see either the old or the new store. Parent directories are
/// created as needed.
pub async fn save_store(path: &Path, store: &SessionStore) -> Result<()> {
    let json = serde_json::to_vec_pretty(store)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::io(parent, e))?;
    }

    let tmp = temp_path(path)?;
    fs::write(&tmp, &json).await.map_err(|e| Error::io(&tmp, e))?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(Error::io(path, e));
    }

    debug!(path = %path.display(), entries = store.len(), bytes = json.len(), "Saved session store");
    Ok(())
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::InvalidPath(path.to_path_buf()))?;
    Ok(path.with_file_name(format!(".{file_name}.tmp")))
}
