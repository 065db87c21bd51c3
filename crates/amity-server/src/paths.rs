use std::path::PathBuf;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct AmityPaths {
    pub base_dir: PathBuf,
    pub db_path: PathBuf,
    pub socket_path: PathBuf,
    pub config_path: PathBuf,
}

impl AmityPaths {
    pub fn from_env() -> Self {
        if let Some(dir) = std::env::var_os("AMITY_DATA_DIR") {
            return Self::from_base(PathBuf::from(dir));
        }
        if let Some(home) = std::env::var_os("HOME") {
            return Self::from_base(PathBuf::from(home).join(".amity"));
        }
        Self::from_base(PathBuf::from(".amity"))
    }

    pub fn from_base(base_dir: PathBuf) -> Self {
        let db_path = base_dir.join("amity.db");
        let socket_path = base_dir.join("amity.sock");
        let config_path = base_dir.join("amity.toml");
        Self {
            base_dir,
            db_path,
            socket_path,
            config_path,
        }
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.base_dir)
            .with_context(|| format!("Failed to create data dir: {}", self.base_dir.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_derive_from_base() {
        let paths = AmityPaths::from_base(PathBuf::from("/srv/amity"));
        assert_eq!(paths.db_path, PathBuf::from("/srv/amity/amity.db"));
        assert_eq!(paths.socket_path, PathBuf::from("/srv/amity/amity.sock"));
        assert_eq!(paths.config_path, PathBuf::from("/srv/amity/amity.toml"));
    }

    #[test]
    fn test_ensure_dirs_creates_nested_base() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AmityPaths::from_base(dir.path().join("nested").join("data"));
        paths.ensure_dirs().unwrap();
        assert!(paths.base_dir.is_dir());
    }
}
