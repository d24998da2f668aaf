use std::fs;
use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

const DEFAULT_SOCKET: &str = "/var/run/lldpd.socket";
const DEFAULT_INTERVAL_SECS: u64 = 30;
/// Unprivileged uid/gid the worker drops to after the monitor is forked off,
/// matching the conventional `nobody` account when no dedicated one exists.
const DEFAULT_WORKER_UID: u32 = 65534;
const DEFAULT_WORKER_GID: u32 = 65534;

/// `lldpd [-d]... [--socket PATH] [--interval SECS] [--config PATH]`
/// (section 6.1). Repeating `-d` raises verbosity: 0=info, 1=debug, 2+=trace.
#[derive(Parser, Debug)]
#[command(name = "lldpd", about = "Link-layer neighbor discovery daemon")]
pub struct Cli {
    #[arg(short = 'd', action = clap::ArgAction::Count)]
    pub verbosity: u8,

    #[arg(long)]
    pub socket: Option<PathBuf>,

    #[arg(long)]
    pub interval: Option<u64>,

    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// The subset of [`Config`] that may also come from a TOML file. CLI flags,
/// where given, override the file (section 6.1's "file-then-flags
/// layering").
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    socket: Option<PathBuf>,
    interval_secs: Option<u64>,
    verbosity: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub socket: PathBuf,
    pub interval_secs: u64,
    pub verbosity: u8,
    pub worker_uid: u32,
    pub worker_gid: u32,
}

impl Config {
    pub fn load(cli: &Cli) -> Self {
        let file = match &cli.config {
            Some(path) => load_file_config(path),
            None => FileConfig::default(),
        };

        Config {
            socket: cli
                .socket
                .clone()
                .or(file.socket)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SOCKET)),
            interval_secs: cli.interval.or(file.interval_secs).unwrap_or(DEFAULT_INTERVAL_SECS),
            verbosity: if cli.verbosity > 0 { cli.verbosity } else { file.verbosity.unwrap_or(0) },
            worker_uid: DEFAULT_WORKER_UID,
            worker_gid: DEFAULT_WORKER_GID,
        }
    }
}

fn load_file_config(path: &PathBuf) -> FileConfig {
    let contents = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("reading config file {}: {}", path.display(), err));
    toml::from_str(&contents)
        .unwrap_or_else(|err| panic!("parsing config file {}: {}", path.display(), err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_fall_back_to_defaults_with_no_file() {
        let cli = Cli { verbosity: 0, socket: None, interval: None, config: None };
        let config = Config::load(&cli);
        assert_eq!(config.socket, PathBuf::from(DEFAULT_SOCKET));
        assert_eq!(config.interval_secs, DEFAULT_INTERVAL_SECS);
    }

    #[test]
    fn explicit_cli_flags_override_defaults() {
        let cli = Cli {
            verbosity: 2,
            socket: Some(PathBuf::from("/tmp/custom.socket")),
            interval: Some(5),
            config: None,
        };
        let config = Config::load(&cli);
        assert_eq!(config.socket, PathBuf::from("/tmp/custom.socket"));
        assert_eq!(config.interval_secs, 5);
        assert_eq!(config.verbosity, 2);
    }
}
