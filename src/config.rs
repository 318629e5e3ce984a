use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::csfs::errno::Errno;

/// Settings of the command-line front end, read from YAML:
///
/// ```yaml
/// image: virtual_drive.csfs
/// export_dir: exports
/// log_filter: debug
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Backing file of the filesystem
  pub image: PathBuf,
  /// Host directory exported files are written into
  pub export_dir: PathBuf,
  /// `env_logger` filter, `RUST_LOG` still wins
  pub log_filter: String,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      image: PathBuf::from("virtual_drive.csfs"),
      export_dir: PathBuf::from("."),
      log_filter: String::from("info"),
    }
  }
}

impl Config {
  pub fn load(config_path: &Path) -> Result<Self, Errno> {
    let config_reader = std::fs::File::open(config_path)?;

    serde_yaml::from_reader::<_, Config>(config_reader)
      .map_err(|_| Errno::InvalidArgument("config: malformed yaml"))
  }
}


// vim:ts=2 sw=2
