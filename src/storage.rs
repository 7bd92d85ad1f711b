use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Root directory for config, logs and persisted state.
///
/// Can be overridden with `$FRESHFOOD_HOME`.
pub fn freshfood_dir() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("FRESHFOOD_HOME") {
        return Ok(PathBuf::from(path));
    }

    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("No home directory"))?;
    Ok(home.join(".freshfood"))
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    let tmp_path = path.with_extension("tmp");
    let file = std::fs::File::create(&tmp_path)?;
    let mut writer = std::io::BufWriter::new(file);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    std::fs::rename(tmp_path, path)?;
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Durable key-value store. Each key is one JSON file in `dir`.
#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Load the value stored under `key`, `None` if nothing was stored yet.
    pub async fn load<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let path = self.path_for(key);
        tokio::task::spawn_blocking(move || {
            if !path.exists() {
                return Ok(None);
            }
            read_json(&path)
                .map(Some)
                .with_context(|| format!("reading {}", path.display()))
        })
        .await?
    }

    /// Overwrite the value stored under `key`.
    pub async fn save<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let path = self.path_for(key);
        // Serialize up front so the blocking task owns plain data.
        let json = serde_json::to_value(value)?;
        tokio::task::spawn_blocking(move || {
            write_json(&path, &json).with_context(|| format!("writing {}", path.display()))
        })
        .await?
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        tokio::task::spawn_blocking(move || {
            if path.exists() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("removing {}", path.display()))?;
            }
            Ok::<(), anyhow::Error>(())
        })
        .await?
    }
}
