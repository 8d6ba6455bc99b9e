pub mod error;
pub mod settings;
pub mod spec;

pub use error::*;
pub use settings::Settings;
pub use spec::{SPEC_FILE_NAME, SpecDocument, find_spec_file, load_spec, resolve_spec_path};

use std::path::PathBuf;

/// gproj's directory under the platform config dir
pub fn get_config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("gproj"))
}
