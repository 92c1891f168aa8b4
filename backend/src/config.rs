use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use tracing::{info, warn};
use wheel_shared::prize::{default_prizes, Prize};
use wheel_shared::validation::parse_prize_list;

use crate::error::AppError;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_STATIC_DIR: &str = "dist";

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub static_dir: PathBuf,
    pub prizes_file: Option<PathBuf>,
    /// Empty means any origin may connect.
    pub cors_origins: Vec<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            prizes_file: None,
            cors_origins: Vec::new(),
        }
    }
}

impl RelayConfig {
    /// Reads `PORT`, `BIND_ADDR`, `STATIC_DIR`, `PRIZES_FILE` and
    /// `CORS_ORIGINS`. Unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT") {
            match port.trim().parse() {
                Ok(port) => config.port = port,
                Err(_) => warn!("Ignoring invalid PORT {:?}, using {}", port, DEFAULT_PORT),
            }
        }
        if let Some(addr) = lookup("BIND_ADDR") {
            match addr.trim().parse() {
                Ok(addr) => config.bind_addr = addr,
                Err(_) => warn!("Ignoring invalid BIND_ADDR {:?}", addr),
            }
        }
        if let Some(dir) = lookup("STATIC_DIR").filter(|d| !d.trim().is_empty()) {
            config.static_dir = PathBuf::from(dir);
        }
        config.prizes_file = lookup("PRIZES_FILE")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        if let Some(origins) = lookup("CORS_ORIGINS") {
            config.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }

        config
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// The prize list the relay starts with: `PRIZES_FILE` when it is set
    /// and valid, the built-in list otherwise.
    pub fn initial_prizes(&self) -> Vec<Prize> {
        let Some(path) = &self.prizes_file else {
            return default_prizes();
        };
        match load_prizes(path) {
            Ok(prizes) => {
                info!("Loaded {} prizes from {}", prizes.len(), path.display());
                prizes
            }
            Err(e) => {
                warn!("Could not use {}: {}. Falling back to the built-in prizes", path.display(), e);
                default_prizes()
            }
        }
    }
}

pub fn load_prizes(path: &std::path::Path) -> Result<Vec<Prize>, AppError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(parse_prize_list(&raw)?)
}
