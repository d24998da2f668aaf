use std::os::unix::net::UnixStream;

use ctlproto::{read_frame, write_frame, CtlError, Request, Response};
use wire::logging::{warn, Logger};

use crate::state::WorkerState;

/// Services one request read off an already-accepted control-socket
/// connection (section 4.5): decode, dispatch against `WorkerState`, encode
/// and write the reply. A malformed request closes the connection rather
/// than replying -- the client is expected to retry with a fresh one.
pub fn handle_connection(stream: &mut UnixStream, state: &mut WorkerState, log: &Logger) {
    let (msg_type, payload) = match read_frame(stream) {
        Ok(frame) => frame,
        Err(CtlError::Io(err)) if err.kind() == std::io::ErrorKind::UnexpectedEof => return,
        Err(err) => {
            warn!(log, "control request framing error"; "error" => err.to_string());
            return;
        }
    };

    let request = match Request::decode(msg_type, &payload) {
        Ok(request) => request,
        Err(err) => {
            warn!(log, "control request decode error"; "error" => err.to_string());
            return;
        }
    };

    let response = state.handle_request(request);
    let (reply_type, reply_payload) = response.encode();
    if let Err(err) = write_frame(stream, reply_type, &reply_payload) {
        warn!(log, "control reply write error"; "error" => err.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::os::unix::io::AsRawFd;
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
        WorkerState::new(privsep::PrivClient::new(worker_side), config, wire::logging::discard())
    }

    #[test]
    fn get_interfaces_round_trips_over_a_real_socketpair() {
        let mut state = test_state();
        let (mut client, mut server) = UnixStream::pair().unwrap();

        write_frame(&mut client, ctlproto::MessageType::GetInterfaces, &[]).unwrap();
        handle_connection(&mut server, &mut state, &wire::logging::discard());

        let (msg_type, payload) = read_frame(&mut client).unwrap();
        let response = Response::decode(msg_type, &payload, &ctlproto::registry()).unwrap();
        assert!(matches!(response, Response::Interfaces(names) if names.is_empty()));
        // Keep the server's fd referenced for the lifetime of the test.
        let _ = server.as_raw_fd();
    }
}
