use std::{env, fs, path::{Path, PathBuf}};

use webcron_models::errors::SendableError;

/// Resolve `path` against the current working directory.
pub fn absolute_path(path: &Path) -> Result<PathBuf, SendableError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(env::current_dir()?.join(path))
}

/// Create the parent directory of `path` if it does not exist yet.
pub fn ensure_parent_dir(path: &Path) -> Result<PathBuf, SendableError> {
    let absolute = absolute_path(path)?;
    if let Some(parent) = absolute.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(absolute)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("logs").join("nested").join("webcron.log");

        let resolved = ensure_parent_dir(&target).unwrap();

        assert_eq!(resolved, target);
        assert!(dir.path().join("logs").join("nested").is_dir());
        assert!(!target.exists());
    }

    #[test]
    fn relative_paths_are_anchored_at_cwd() {
        let resolved = absolute_path(Path::new("webcron.db")).unwrap();
        assert_eq!(resolved, env::current_dir().unwrap().join("webcron.db"));
    }
}
