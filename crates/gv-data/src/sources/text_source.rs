use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::DataError;

/// Delimited text loaded from disk
#[derive(Debug, Clone)]
pub struct TextSource {
    /// Path the text was read from
    path: PathBuf,
    /// File contents
    text: String,
}

impl TextSource {
    /// Read a file on the blocking pool
    pub async fn load(path: PathBuf) -> Result<Self, DataError> {
        let text = tokio::task::spawn_blocking({
            let path = path.clone();
            move || Self::read_file(&path)
        })
        .await??;

        info!("Loaded {} bytes from {:?}", text.len(), path);
        Ok(Self { path, text })
    }

    /// Wrap text that did not come from a file
    pub fn from_text(name: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: name.into(),
            text: text.into(),
        }
    }

    fn read_file(path: &Path) -> Result<String, DataError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Ok(text)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown.csv")
    }
}
