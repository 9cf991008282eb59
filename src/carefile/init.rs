use crate::api::CarefileApi;
use crate::config::CarefileConfig;
use crate::error::{CarefileError, Result};
use directories::ProjectDirs;
use log::debug;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the platform data directory.
pub const HOME_ENV: &str = "CAREFILE_HOME";

pub struct CarefileContext {
    pub api: CarefileApi,
    pub config: CarefileConfig,
    pub data_dir: PathBuf,
}

/// Picks the data directory: explicit flag, then `CAREFILE_HOME`, then the
/// platform data dir.
pub fn resolve_data_dir(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir);
    }
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let proj_dirs = ProjectDirs::from("com", "carefile", "carefile").ok_or_else(|| {
        CarefileError::Config("could not determine a data directory; set CAREFILE_HOME".into())
    })?;
    Ok(proj_dirs.data_dir().to_path_buf())
}

/// Loads the directory's config and opens every collection in it.
pub fn initialize(data_dir: &Path) -> Result<CarefileContext> {
    std::fs::create_dir_all(data_dir)?;
    let config = CarefileConfig::load(data_dir)?;
    debug!(
        "event=initialize module=init status=ok data_dir={} file_ext={} unique_ids={}",
        data_dir.display(),
        config.file_ext(),
        config.unique_ids
    );
    let api = CarefileApi::open(data_dir, &config)?;
    Ok(CarefileContext {
        api,
        config,
        data_dir: data_dir.to_path_buf(),
    })
}
