//! Size-based rotation of the session store file.
//!
//! An oversized store file is renamed to `<name>.bak.<stamp>` beside it,
//! after which only the [`BACKUP_RETENTION`] newest backups are kept.
//!
//! `<stamp>` is an epoch-millisecond value, always past both the newest
//! backup already on disk and every stamp issued earlier in this process.
//! Two rotations never share a stamp, a new backup always sorts newest even
//! if the clock went backwards, and stamps sort numerically.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

use tokio::fs;
use tracing::{debug, info, trace, warn};

use crate::entry::now_ms;
use crate::error::{Error, Result};
use crate::settings::BACKUP_RETENTION;

/// Highest stamp handed out so far in this process.
static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Rotate `path` to a backup if it is larger than `max_bytes`.
///
/// Returns `Ok(true)` exactly when the file was renamed. A missing file
/// counts as empty and is never rotated. Failing to delete an old backup is
/// logged and does not fail the rotation.
pub async fn rotate_session_file(path: &Path, max_bytes: u64) -> Result<bool> {
    let size = file_size(path).await?;
    if size <= max_bytes {
        trace!(path = %path.display(), size, max_bytes, "Store file under rotation threshold");
        return Ok(false);
    }

    let (dir, file_name) = split_path(path)?;
    let backup = unique_backup_path(&dir, &file_name).await?;
    move_to_backup(path, &backup).await?;

    info!(
        path = %path.display(),
        backup = %backup.display(),
        size,
        max_bytes,
        "Rotated session store file"
    );

    let removed = prune_backups(&dir, &file_name, BACKUP_RETENTION).await;
    if removed > 0 {
        debug!(removed, "Removed old session store backups");
    }

    Ok(true)
}

/// Whether `path` is larger than `max_bytes`. A missing file is not.
pub(crate) async fn exceeds_threshold(path: &Path, max_bytes: u64) -> Result<bool> {
    Ok(file_size(path).await? > max_bytes)
}

/// Backups of `path`, newest first.
pub async fn list_backups(path: &Path) -> Result<Vec<PathBuf>> {
    let (dir, file_name) = split_path(path)?;
    let backups = scan_backups(&dir, &file_name).await?;
    Ok(backups.into_iter().map(|(_, p)| p).collect())
}

/// Size of the file at `path`, or 0 if it does not exist.
async fn file_size(path: &Path) -> Result<u64> {
    match fs::metadata(path).await {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Single rename of the store file to its backup name.
async fn move_to_backup(path: &Path, backup: &Path) -> Result<()> {
    fs::rename(path, backup)
        .await
        .map_err(|e| Error::io(path, e))
}

/// Directory and file name of a store path. A bare file name lives in `.`.
fn split_path(path: &Path) -> Result<(PathBuf, String)> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::InvalidPath(path.to_path_buf()))?
        .to_string();

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    Ok((dir, file_name))
}

fn backup_prefix(file_name: &str) -> String {
    format!("{file_name}.bak.")
}

/// Next stamp, at least `floor`: the current time, or one past the last
/// stamp if that is later.
fn next_stamp(floor: i64) -> i64 {
    let now = now_ms().max(floor);
    let previous = LAST_STAMP
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or_else(|last| last);
    now.max(previous + 1)
}

/// A backup path that does not exist yet and sorts after every existing
/// backup of `file_name`.
async fn unique_backup_path(dir: &Path, file_name: &str) -> Result<PathBuf> {
    let prefix = backup_prefix(file_name);
    let floor = scan_backups(dir, file_name)
        .await?
        .first()
        .map_or(0, |(newest, _)| newest.saturating_add(1));

    loop {
        let candidate = dir.join(format!("{prefix}{}", next_stamp(floor)));
        let exists = fs::try_exists(&candidate)
            .await
            .map_err(|e| Error::io(&candidate, e))?;
        if !exists {
            return Ok(candidate);
        }
    }
}

/// Backups of `file_name` in `dir` with their stamps, newest first.
async fn scan_backups(dir: &Path, file_name: &str) -> Result<Vec<(i64, PathBuf)>> {
    let prefix = backup_prefix(file_name);
    let mut backups = Vec::new();

    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(backups),
        Err(e) => return Err(Error::io(dir, e)),
    };

    while let Some(entry) = entries.next_entry().await.map_err(|e| Error::io(dir, e))? {
        let name = entry.file_name();
        let name = name.to_string_lossy();

        let Some(stamp) = name.strip_prefix(prefix.as_str()).and_then(parse_stamp) else {
            continue;
        };

        match entry.file_type().await {
            Ok(file_type) if file_type.is_file() => backups.push((stamp, entry.path())),
            Ok(_) => {}
            Err(e) => {
                warn!(backup = %entry.path().display(), error = %e, "Failed to inspect backup");
            }
        }
    }

    backups.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(backups)
}

fn parse_stamp(suffix: &str) -> Option<i64> {
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// Delete all but the `keep` newest backups. Returns how many were deleted.
async fn prune_backups(dir: &Path, file_name: &str, keep: usize) -> usize {
    let backups = match scan_backups(dir, file_name).await {
        Ok(backups) => backups,
        Err(e) => {
            warn!(error = %e, "Failed to list session store backups");
            return 0;
        }
    };

    remove_backups(backups.into_iter().skip(keep).map(|(_, p)| p)).await
}

/// Delete each backup, logging the ones that cannot be removed.
async fn remove_backups(paths: impl IntoIterator<Item = PathBuf>) -> usize {
    let mut removed = 0;
    for path in paths {
        match fs::remove_file(&path).await {
            Ok(()) => {
                trace!(backup = %path.display(), "Removed old backup");
                removed += 1;
            }
            Err(e) => {
                warn!(backup = %path.display(), error = %e, "Failed to remove old backup");
            }
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    async fn write_bytes(path: &Path, len: usize) -> Vec<u8> {
        let content: Vec<u8> = (0..len).map(|i| b'a' + (i % 26) as u8).collect();
        fs::write(path, &content).await.unwrap();
        content
    }

    #[tokio::test]
    async fn test_missing_file_is_not_rotated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sessions.json");

        assert!(!rotate_session_file(&path, 0).await.unwrap());
        assert!(list_backups(&path).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_under_threshold_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sessions.json");
        let content = write_bytes(&path, 100).await;

        assert!(!rotate_session_file(&path, 100).await.unwrap());
        assert_eq!(fs::read(&path).await.unwrap(), content);
        assert!(list_backups(&path).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_over_threshold_rotates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sessions.json");
        let content = write_bytes(&path, 200).await;

        assert!(rotate_session_file(&path, 100).await.unwrap());
        assert!(!fs::try_exists(&path).await.unwrap());

        let backups = list_backups(&path).await.unwrap();
        assert_eq!(backups.len(), 1);
        let name = backups[0].file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("sessions.json.bak."));
        assert_eq!(fs::read(&backups[0]).await.unwrap(), content);
    }

    #[tokio::test]
    async fn test_rapid_rotations_keep_three_newest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sessions.json");
        let mut created = Vec::new();

        for i in 0..5 {
            write_bytes(&path, 200 + i).await;
            assert!(rotate_session_file(&path, 100).await.unwrap());
            created.push(list_backups(&path).await.unwrap()[0].clone());
        }

        // Every rotation produced a distinct backup name
        let unique: BTreeSet<_> = created.iter().collect();
        assert_eq!(unique.len(), 5);

        let retained = list_backups(&path).await.unwrap();
        assert_eq!(retained.len(), 3);
        let newest: Vec<_> = created.iter().rev().take(3).cloned().collect();
        assert_eq!(retained, newest);
        assert_eq!(fs::read(&retained[0]).await.unwrap().len(), 204);
    }

    #[tokio::test]
    async fn test_retention_ignores_unrelated_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sessions.json");
        for stamp in [1, 2, 3, 4] {
            fs::write(dir.path().join(format!("sessions.json.bak.{stamp}")), b"x")
                .await
                .unwrap();
        }
        fs::write(dir.path().join("other.json.bak.1"), b"x").await.unwrap();
        fs::write(dir.path().join("sessions.json.bak.notes"), b"x").await.unwrap();
        write_bytes(&path, 50).await;

        assert!(rotate_session_file(&path, 10).await.unwrap());

        let retained: Vec<String> = list_backups(&path)
            .await
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(retained.len(), 3);
        assert_eq!(retained[1..], ["sessions.json.bak.4", "sessions.json.bak.3"]);
        assert!(fs::try_exists(dir.path().join("other.json.bak.1")).await.unwrap());
        assert!(fs::try_exists(dir.path().join("sessions.json.bak.notes")).await.unwrap());
    }

    #[tokio::test]
    async fn test_stamp_skips_existing_backup() {
        let dir = TempDir::new().unwrap();
        let taken = next_stamp(0) + 1;
        let occupied = dir.path().join(format!("sessions.json.bak.{taken}"));
        fs::write(&occupied, b"old").await.unwrap();

        let fresh = unique_backup_path(dir.path(), "sessions.json").await.unwrap();
        assert_ne!(fresh, occupied);
        assert!(!fs::try_exists(&fresh).await.unwrap());
    }

    #[tokio::test]
    async fn test_new_backup_sorts_after_future_stamps() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sessions.json");
        let ahead = now_ms() + 60 * 60 * 1000;
        for i in 0..3 {
            fs::write(dir.path().join(format!("sessions.json.bak.{}", ahead + i)), b"old")
                .await
                .unwrap();
        }
        let content = write_bytes(&path, 200).await;

        assert!(rotate_session_file(&path, 100).await.unwrap());

        let retained = list_backups(&path).await.unwrap();
        assert_eq!(retained.len(), 3);
        assert_eq!(fs::read(&retained[0]).await.unwrap(), content);
        let newest = retained[0].file_name().unwrap().to_string_lossy().to_string();
        assert!(newest > format!("sessions.json.bak.{}", ahead + 2));
        assert!(
            !fs::try_exists(dir.path().join(format!("sessions.json.bak.{ahead}")))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_stat_failure_is_an_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        let content = write_bytes(&blocker, 50).await;

        let err = rotate_session_file(&blocker.join("sessions.json"), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(fs::read(&blocker).await.unwrap(), content);
    }

    #[tokio::test]
    async fn test_failed_rename_leaves_original_intact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sessions.json");
        let content = write_bytes(&path, 200).await;
        let unreachable = dir.path().join("missing").join("sessions.json.bak.1");

        let err = move_to_backup(&path, &unreachable).await.unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(fs::read(&path).await.unwrap(), content);
        assert!(list_backups(&path).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_failure_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let gone = dir.path().join("sessions.json.bak.1");
        let present = dir.path().join("sessions.json.bak.2");
        fs::write(&present, b"x").await.unwrap();

        assert_eq!(remove_backups([gone, present.clone()]).await, 1);
        assert!(!fs::try_exists(&present).await.unwrap());
    }

    #[tokio::test]
    async fn test_exceeds_threshold() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sessions.json");
        assert!(!exceeds_threshold(&path, 0).await.unwrap());

        write_bytes(&path, 10).await;
        assert!(exceeds_threshold(&path, 9).await.unwrap());
        assert!(!exceeds_threshold(&path, 10).await.unwrap());
    }

    #[test]
    fn test_next_stamp_respects_floor() {
        let floor = now_ms() + 1_000_000;
        assert!(next_stamp(floor) >= floor);
        assert!(next_stamp(0) > floor);
    }

    #[test]
    fn test_next_stamp_strictly_increases() {
        let stamps: Vec<i64> = (0..100).map(|_| next_stamp(0)).collect();
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_split_bare_file_name() {
        let (dir, name) = split_path(Path::new("sessions.json")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, "sessions.json");
        assert!(matches!(split_path(Path::new("/")), Err(Error::InvalidPath(_))));
    }

    #[test]
    fn test_parse_stamp() {
        assert_eq!(parse_stamp("1760000000000"), Some(1_760_000_000_000));
        assert_eq!(parse_stamp(""), None);
        assert_eq!(parse_stamp("-1"), None);
        assert_eq!(parse_stamp("12.tmp"), None);
    }
}
