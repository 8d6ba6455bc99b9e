use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config directory not found")]
    ConfigDirNotFound,

    #[error("cache directory not found; set GPROJ_CACHE_DIR")]
    CacheDirNotFound,

    #[error(
        "googlecloudproject.yaml file not found in {} or any parent directory\n\
        pass --spec or set GPROJ_SPEC to point at it directly",
        .start.display()
    )]
    SpecNotFound { start: PathBuf },

    #[error("took more than {0} steps up the parent hierarchy looking for googlecloudproject.yaml")]
    SearchTooDeep(usize),

    #[error("error parsing {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid value {value:?} for {name}")]
    InvalidSetting { name: String, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
