use std::path::PathBuf;

pub const DB_FILE: &str = "index.sqlite3";
pub const MEMORY_DIR: &str = "memory";
pub const MEMORY_FILE: &str = "memory_data.json";

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("missing data directory")]
    MissingDataDir,
}

pub fn data_root() -> Result<PathBuf, PathError> {
    if let Ok(override_dir) = std::env::var("SECOND_BRAIN_DATA_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let dir = dirs::data_dir().ok_or(PathError::MissingDataDir)?;
    Ok(dir.join("second-brain"))
}

pub fn default_db_path() -> Result<PathBuf, PathError> {
    Ok(data_root()?.join(DB_FILE))
}

pub fn default_memory_path() -> Result<PathBuf, PathError> {
    Ok(data_root()?.join(MEMORY_DIR).join(MEMORY_FILE))
}
