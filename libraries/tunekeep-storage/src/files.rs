//! Moving tracks between pools

use std::path::{Path, PathBuf};
use tokio::fs;
use tunekeep_core::naming::numbered_name;
use tunekeep_core::{Result, TuneError};

const MAX_UNIQUE_ATTEMPTS: u32 = 10_000;

/// Move a file, falling back to copy + delete across filesystems
pub async fn move_file(source: &Path, dest: &Path) -> Result<()> {
    // Try rename first (fast if on same filesystem)
    if fs::rename(source, dest).await.is_ok() {
        return Ok(());
    }

    fs::copy(source, dest).await?;
    fs::remove_file(source).await?;
    Ok(())
}

/// Move `source` into `dir` under its current name, refusing to overwrite
pub async fn move_into(source: &Path, dir: &Path) -> Result<PathBuf> {
    let file_name = source
        .file_name()
        .ok_or_else(|| TuneError::NotFound(source.to_path_buf()))?;
    let dest = dir.join(file_name);
    if fs::try_exists(&dest).await? {
        return Err(TuneError::move_conflict(source, dest));
    }
    fs::create_dir_all(dir).await?;
    move_file(source, &dest).await?;
    Ok(dest)
}

/// Move `source` into `dir`, renaming to `name (2).ext`, `name (3).ext`, ... on collision
pub async fn move_unique(source: &Path, dir: &Path, file_name: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).await?;
    let dest = unique_destination(dir, file_name).await?;
    if dest != source {
        move_file(source, &dest).await?;
    }
    Ok(dest)
}

/// First free path for `file_name` in `dir`
pub async fn unique_destination(dir: &Path, file_name: &str) -> Result<PathBuf> {
    let candidate = dir.join(file_name);
    if !fs::try_exists(&candidate).await? {
        return Ok(candidate);
    }

    let as_path = Path::new(file_name);
    let stem = as_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    let extension = as_path.extension().and_then(|e| e.to_str());

    for n in 2..MAX_UNIQUE_ATTEMPTS {
        let path = dir.join(numbered_name(&stem, extension, n));
        if !fs::try_exists(&path).await? {
            return Ok(path);
        }
    }

    Err(TuneError::move_conflict(dir.join(file_name), dir.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_unique_destination_counts_from_two() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            unique_destination(dir.path(), "song.mp3").await.unwrap(),
            dir.path().join("song.mp3")
        );

        std::fs::write(dir.path().join("song.mp3"), b"a").unwrap();
        assert_eq!(
            unique_destination(dir.path(), "song.mp3").await.unwrap(),
            dir.path().join("song (2).mp3")
        );

        std::fs::write(dir.path().join("song (2).mp3"), b"b").unwrap();
        assert_eq!(
            unique_destination(dir.path(), "song.mp3").await.unwrap(),
            dir.path().join("song (3).mp3")
        );
    }

    #[tokio::test]
    async fn test_move_into_refuses_overwrite() {
        let src_dir = TempDir::new().unwrap();
        let dst_dir = TempDir::new().unwrap();
        let source = src_dir.path().join("a.mp3");
        std::fs::write(&source, b"new").unwrap();
        std::fs::write(dst_dir.path().join("a.mp3"), b"old").unwrap();

        let result = move_into(&source, dst_dir.path()).await;
        assert!(matches!(result, Err(TuneError::MoveConflict { .. })));
        assert!(source.exists());
        assert_eq!(std::fs::read(dst_dir.path().join("a.mp3")).unwrap(), b"old");
    }

    #[tokio::test]
    async fn test_move_unique_renames() {
        let src_dir = TempDir::new().unwrap();
        let dst_dir = TempDir::new().unwrap();
        let source = src_dir.path().join("a.mp3");
        std::fs::write(&source, b"new").unwrap();
        std::fs::write(dst_dir.path().join("a.mp3"), b"old").unwrap();

        let dest = move_unique(&source, dst_dir.path(), "a.mp3").await.unwrap();
        assert_eq!(dest, dst_dir.path().join("a (2).mp3"));
        assert!(!source.exists());
    }
}
