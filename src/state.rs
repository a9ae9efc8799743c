use crate::error::Error;
use crate::watcher::IpStore;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Last announced IP, kept as the whole content of a single file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl IpStore for FileStore {
    async fn load(&self) -> Result<Option<String>, Error> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let ip = contents.lines().next().unwrap_or_default().trim();
                Ok((!ip.is_empty()).then(|| ip.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, ip: &str) -> Result<(), Error> {
        tokio::fs::write(&self.path, ip).await?;
        Ok(())
    }
}
