use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use ctlproto::{Request, Response};
use ifaces::ClassifyResult;
use marshal::{NodeRef, Registry};
use model::{Chassis, Hardware, NeighborTable};
use privsep::PrivClient;
use wire::logging::{info, warn, Logger};

use crate::config::Config;

/// Everything the worker owns for the lifetime of the process (section 5's
/// "global mutable state" realized as one owned struct rather than statics):
/// the privilege-separation client, the Hardware table, per-Hardware
/// neighbor tables, the process-lifetime local chassis, and the node
/// registry the control protocol needs to decode/encode replies.
pub struct WorkerState {
    pub priv_client: PrivClient,
    pub hardware: Vec<Hardware>,
    pub neighbors: HashMap<String, NeighborTable>,
    pub local_chassis: NodeRef,
    pub registry: Registry,
    pub config: Config,
    pub log: Logger,
}

impl WorkerState {
    pub fn new(priv_client: PrivClient, config: Config, log: Logger) -> Self {
        let hostname = local_hostname();
        let local_chassis: NodeRef =
            Rc::new(RefCell::new(Chassis::new_local(hostname, "lldpd")));

        WorkerState {
            priv_client,
            hardware: Vec::new(),
            neighbors: HashMap::new(),
            local_chassis,
            registry: ctlproto::registry(),
            config,
            log,
        }
    }

    /// Runs one discovery scan (section 4.3) and reconciles the Hardware
    /// table: newly-accepted interfaces get their descriptors opened and
    /// join the discovery multicast groups; interfaces no longer present
    /// are torn down via `rawio::cleanup`.
    pub fn rescan(&mut self) -> ClassifyResult<()> {
        let snapshots = ifaces::enumerate_interfaces().map_err(|err| {
            ifaces::ClassifyError::Io(std::io::Error::new(std::io::ErrorKind::Other, err))
        })?;
        let fresh = ifaces::scan(&mut self.priv_client, &snapshots)?;

        let fresh_names: std::collections::HashSet<&str> =
            fresh.iter().map(|hw| hw.ifname.as_str()).collect();

        let mut kept = Vec::new();
        for mut hw in self.hardware.drain(..) {
            if fresh_names.contains(hw.ifname.as_str()) {
                kept.push(hw);
            } else {
                info!(self.log, "interface lost, tearing down"; "ifname" => &hw.ifname);
                if let Err(err) = rawio::cleanup(&mut self.priv_client, &mut hw) {
                    warn!(self.log, "cleanup failed"; "ifname" => &hw.ifname, "error" => err.to_string());
                }
                self.neighbors.remove(&hw.ifname);
            }
        }

        let kept_names: std::collections::HashSet<String> =
            kept.iter().map(|hw| hw.ifname.clone()).collect();

        for mut hw in fresh {
            if kept_names.contains(hw.ifname.as_str()) {
                continue;
            }
            info!(self.log, "interface discovered"; "ifname" => &hw.ifname);
            if let Err(err) = rawio::open_for_hardware(&mut self.priv_client, &mut hw) {
                warn!(self.log, "failed to open interface"; "ifname" => &hw.ifname, "error" => err.to_string());
                continue;
            }
            if let Err(err) = rawio::join_discovery_multicast(&mut self.priv_client, &hw.ifname) {
                warn!(self.log, "failed to join multicast groups"; "ifname" => &hw.ifname, "error" => err.to_string());
                continue;
            }
            self.neighbors.entry(hw.ifname.clone()).or_insert_with(NeighborTable::new);
            kept.push(hw);
        }

        self.hardware = kept;
        Ok(())
    }

    /// Serves one control-socket request (section 4.5). Unknown interfaces
    /// reply `Response::None` rather than an error -- the entity simply
    /// doesn't exist.
    pub fn handle_request(&mut self, request: Request) -> Response {
        match request {
            Request::GetInterfaces => {
                Response::Interfaces(self.hardware.iter().map(|hw| hw.ifname.clone()).collect())
            }
            Request::GetInterface { ifname } | Request::GetPort { ifname } => {
                match self.hardware.iter().find(|hw| hw.ifname == ifname) {
                    Some(hw) => Response::Node(Rc::new(RefCell::new(hw.port.clone()))),
                    None => Response::None,
                }
            }
            Request::GetChassis { ifname } => {
                if self.hardware.iter().any(|hw| hw.ifname == ifname) {
                    Response::Node(self.local_chassis.clone())
                } else {
                    Response::None
                }
            }
            Request::GetVlans { ifname } => {
                match self.hardware.iter().find(|hw| hw.ifname == ifname) {
                    Some(hw) => Response::Vlans(hw.port.vlans.clone()),
                    None => Response::None,
                }
            }
            Request::SetPort { ifname, location, power_policy } => {
                match self.hardware.iter_mut().find(|hw| hw.ifname == ifname) {
                    Some(hw) => {
                        if let Some(location) = location {
                            hw.port.description = location;
                        }
                        let _ = power_policy; // power policy has no local effect yet
                        Response::Ack
                    }
                    None => Response::None,
                }
            }
        }
    }
}

fn local_hostname() -> String {
    gethostname::gethostname().into_string().unwrap_or_else(|_| "localhost".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{Counters, HardwareKind, PortIdSubtype};
    use std::path::PathBuf;

    fn test_state() -> WorkerState {
        let config = Config {
            socket: PathBuf::from("/tmp/test.socket"),
            interval_secs: 30,
            verbosity: 0,
            worker_uid: 65534,
            worker_gid: 65534,
        };
        let (worker_side, _monitor_side) = privsep::Channel::pair().unwrap();
        let mut state =
            WorkerState::new(PrivClient::new(worker_side), config, wire::logging::discard());
        state.hardware.push(sample_hardware());
        state
    }

    fn sample_hardware() -> Hardware {
        Hardware {
            ifname: "eth0".into(),
            ifindex: 2,
            lladdr: [0, 1, 2, 3, 4, 5],
            kind: HardwareKind::Ethernet,
            send_fd: -1,
            recv_fds: Vec::new(),
            flags: 0,
            mtu: 1500,
            counters: Counters::default(),
            port: model::Port::new(PortIdSubtype::InterfaceName, b"eth0".to_vec(), "eth0"),
        }
    }

    #[test]
    fn get_interfaces_lists_known_hardware() {
        let mut state = test_state();
        let response = state.handle_request(Request::GetInterfaces);
        assert!(matches!(response, Response::Interfaces(names) if names == vec!["eth0"]));
    }

    #[test]
    fn get_port_on_unknown_interface_returns_none() {
        let mut state = test_state();
        let response = state.handle_request(Request::GetPort { ifname: "eth9".into() });
        assert!(matches!(response, Response::None));
    }

    #[test]
    fn set_port_updates_the_local_description() {
        let mut state = test_state();
        let response = state.handle_request(Request::SetPort {
            ifname: "eth0".into(),
            location: Some("rack 3".into()),
            power_policy: None,
        });
        assert!(matches!(response, Response::Ack));
        assert_eq!(state.hardware[0].port.description, "rack 3");
    }
}
