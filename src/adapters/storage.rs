use crate::domain::ports::Storage;
use crate::utils::error::{Result, VerifyError};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
    max_bytes: u64,
}

impl LocalStorage {
    pub fn new(base_path: String, max_bytes: u64) -> Self {
        Self {
            base_path,
            max_bytes,
        }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);

        let size = tokio::fs::metadata(&full_path).await?.len();
        if size > self.max_bytes {
            return Err(VerifyError::unreadable(format!(
                "{} is {} bytes, limit is {}",
                full_path.display(),
                size,
                self.max_bytes
            )));
        }

        let data = tokio::fs::read(full_path).await?;
        Ok(data)
    }
}
