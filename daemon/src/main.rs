mod config;
mod control;
mod state;
mod worker;

use clap::Parser;
use nix::unistd::{ForkResult, Gid, Uid};
use wire::logging::{error, info};

use config::{Cli, Config};
use state::WorkerState;

fn main() {
    let cli = Cli::parse();
    let config = Config::load(&cli);
    let log = wire::logging::init(config.verbosity);

    let (monitor_channel, worker_channel) = match privsep::Channel::pair() {
        Ok(pair) => pair,
        Err(err) => {
            error!(log, "failed to create privilege-separation channel"; "error" => err.to_string());
            std::process::exit(1);
        }
    };

    match unsafe { nix::unistd::fork() } {
        Ok(ForkResult::Child) => {
            // The monitor keeps root and never touches the network itself
            // (section 4.2): it only validates and performs the handful of
            // privileged operations the worker asks for.
            drop(worker_channel);
            let mut channel = monitor_channel;
            let mut monitor = privsep::Monitor::new(log.clone());
            if let Err(err) = monitor.serve(&mut channel) {
                error!(log, "monitor exited"; "error" => err.to_string());
                std::process::exit(1);
            }
        }
        Ok(ForkResult::Parent { .. }) => {
            drop(monitor_channel);
            if let Err(err) = drop_privileges(config.worker_uid, config.worker_gid) {
                error!(log, "failed to drop privileges"; "error" => err.to_string());
                std::process::exit(1);
            }

            let priv_client = privsep::PrivClient::new(worker_channel);
            let state = WorkerState::new(priv_client, config, log.clone());
            info!(log, "worker ready");
            if let Err(err) = worker::run(state) {
                error!(log, "worker exited"; "error" => err.to_string());
                std::process::exit(1);
            }
        }
        Err(err) => {
            error!(log, "fork failed"; "error" => err.to_string());
            std::process::exit(1);
        }
    }
}

/// Drops the worker from root to the unprivileged account before it ever
/// touches an untrusted socket or parses an announcement (section 4.2's
/// "everything past the fork that isn't the monitor is unprivileged").
/// Group must be dropped before user -- changing gid after uid would fail
/// once root's privileges are gone.
fn drop_privileges(uid: u32, gid: u32) -> nix::Result<()> {
    nix::unistd::setgid(Gid::from_raw(gid))?;
    nix::unistd::setuid(Uid::from_raw(uid))?;
    Ok(())
}
