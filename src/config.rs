// Server configuration, read from a TOML file.
//
// Path comes from $TRACKER_CONFIG, falling back to ./tracker.toml.
// A missing file means "all defaults"; a malformed one is an error.

use std::{fs, io, net::SocketAddr, path::PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const CONFIG_ENV: &str = "TRACKER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "tracker.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    // Shared secret required on mutating requests; None leaves them open
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}
fn default_db_path() -> PathBuf {
    PathBuf::from("data/tracker.db")
}
fn default_upload_dir() -> PathBuf {
    PathBuf::from("data/uploads")
}
fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}
fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            db_path: default_db_path(),
            upload_dir: default_upload_dir(),
            static_dir: default_static_dir(),
            secret: None,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Config {
    pub fn load() -> io::Result<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(path)
    }

    pub fn load_from(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let text = match fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No config at {:?}, using defaults", path);
                return Ok(Self::default());
            }
            Err(e) => return Err(e),
        };

        let config: Config =
            toml::from_str(&text).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        info!("Loaded config from {:?}", path);

        if config.secret.as_deref().is_some_and(|s| s.trim().is_empty()) {
            warn!("secret is blank; mutating requests will need an empty header");
        }
        Ok(config)
    }
}
