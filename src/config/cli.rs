use crate::core::Storage;
use crate::utils::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn full_path(&self, path: &str) -> PathBuf {
        Path::new(&self.base_path).join(path)
    }

    /// Regular files directly under the base directory with their sizes, sorted by name.
    pub fn list_files(&self) -> Result<Vec<(String, u64)>> {
        let base = Path::new(&self.base_path);
        if !base.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(base)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if metadata.is_file() {
                files.push((entry.file_name().to_string_lossy().to_string(), metadata.len()));
            }
        }
        files.sort();
        Ok(files)
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let data = fs::read(self.full_path(path))?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> bool {
        self.full_path(path).is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_string_lossy().to_string());

        storage.write_file("nested/out.csv", b"a,b\n").await.unwrap();

        assert!(storage.exists("nested/out.csv").await);
        assert_eq!(storage.read_file("nested/out.csv").await.unwrap(), b"a,b\n");
        assert!(!storage.exists("nested").await);
    }

    #[tokio::test]
    async fn test_list_files_sorted_with_sizes() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_string_lossy().to_string());
        storage.write_file("b.html", b"<html>").await.unwrap();
        storage.write_file("a.json", b"{}").await.unwrap();
        storage.write_file("sub/c.txt", b"x").await.unwrap();

        let files = storage.list_files().unwrap();
        assert_eq!(
            files,
            vec![("a.json".to_string(), 2), ("b.html".to_string(), 6)]
        );
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let storage = LocalStorage::new("/nonexistent/daegu-access-test".to_string());
        assert!(storage.list_files().unwrap().is_empty());
    }
}
