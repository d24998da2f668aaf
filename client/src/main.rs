mod output;

use std::io;
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ctlproto::{read_frame, write_frame, CtlError, Request, Response};

fn ctl_io(err: CtlError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err.to_string())
}

const DEFAULT_SOCKET: &str = "/var/run/lldpd.socket";

const EXIT_SUCCESS: u8 = 0;
const EXIT_USAGE: u8 = 1;
const EXIT_CONNECTION: u8 = 2;

/// `lldpctl [-d] [--socket PATH]` (section 6). Repeating `-d` raises debug
/// verbosity the same way the daemon's flag does.
#[derive(Parser, Debug)]
#[command(name = "lldpctl", about = "Show neighbors discovered by lldpd")]
struct Cli {
    #[arg(short = 'd', action = clap::ArgAction::Count)]
    verbosity: u8,

    #[arg(long)]
    socket: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            eprint!("{}", err);
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let log = wire::logging::init(cli.verbosity);
    let socket = cli.socket.unwrap_or_else(|| PathBuf::from(DEFAULT_SOCKET));

    match run(&socket, &log) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(err) => {
            wire::logging::error!(log, "lldpctl failed"; "error" => err.to_string());
            ExitCode::from(EXIT_CONNECTION)
        }
    }
}

fn run(socket: &PathBuf, log: &wire::logging::Logger) -> io::Result<()> {
    let mut stream = UnixStream::connect(socket).map_err(|err| {
        io::Error::new(err.kind(), format!("connecting to {}: {}", socket.display(), err))
    })?;
    let registry = ctlproto::registry();

    let interfaces = request_interfaces(&mut stream)?;
    wire::logging::debug!(log, "daemon reported interfaces"; "count" => interfaces.len());

    for ifname in &interfaces {
        let port = request_node(&mut stream, &registry, Request::GetPort { ifname: ifname.clone() })?;
        let chassis = request_node(&mut stream, &registry, Request::GetChassis { ifname: ifname.clone() })?;
        let vlans = request_vlans(&mut stream, Request::GetVlans { ifname: ifname.clone() })?;
        output::print_interface(ifname, port.as_ref(), chassis.as_ref(), &vlans);
    }

    Ok(())
}

fn request_interfaces(stream: &mut UnixStream) -> io::Result<Vec<String>> {
    let (msg_type, payload) = Request::GetInterfaces.encode();
    write_frame(stream, msg_type, &payload).map_err(ctl_io)?;
    let (reply_type, reply_payload) = read_frame(stream).map_err(ctl_io)?;
    match Response::decode(reply_type, &reply_payload, &ctlproto::registry()) {
        Ok(Response::Interfaces(names)) => Ok(names),
        Ok(_) => Err(io::Error::new(io::ErrorKind::InvalidData, "unexpected reply to GetInterfaces")),
        Err(err) => Err(io::Error::new(io::ErrorKind::InvalidData, err.to_string())),
    }
}

fn request_node(
    stream: &mut UnixStream,
    registry: &marshal::Registry,
    request: Request,
) -> io::Result<Option<marshal::NodeRef>> {
    let (msg_type, payload) = request.encode();
    write_frame(stream, msg_type, &payload).map_err(ctl_io)?;
    let (reply_type, reply_payload) = read_frame(stream).map_err(ctl_io)?;
    match Response::decode(reply_type, &reply_payload, registry) {
        Ok(Response::Node(node)) => Ok(Some(node)),
        Ok(Response::None) => Ok(None),
        Ok(_) => Err(io::Error::new(io::ErrorKind::InvalidData, "unexpected reply type")),
        Err(err) => Err(io::Error::new(io::ErrorKind::InvalidData, err.to_string())),
    }
}

fn request_vlans(stream: &mut UnixStream, request: Request) -> io::Result<Vec<model::Vlan>> {
    let (msg_type, payload) = request.encode();
    write_frame(stream, msg_type, &payload).map_err(ctl_io)?;
    let (reply_type, reply_payload) = read_frame(stream).map_err(ctl_io)?;
    match Response::decode(reply_type, &reply_payload, &ctlproto::registry()) {
        Ok(Response::Vlans(vlans)) => Ok(vlans),
        Ok(_) => Err(io::Error::new(io::ErrorKind::InvalidData, "unexpected reply to GetVlans")),
        Err(err) => Err(io::Error::new(io::ErrorKind::InvalidData, err.to_string())),
    }
}
