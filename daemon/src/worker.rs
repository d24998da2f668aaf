use std::collections::HashMap;
use std::os::unix::io::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream as StdUnixStream;
use std::time::{Duration, Instant};

use mio::net::{UnixListener, UnixStream};
use mio::unix::SourceFd;
use mio::{Events, Interest, Poll, Token};
use wire::logging::{error, info, warn, Logger};

use crate::control;
use crate::state::WorkerState;

const CONTROL_TOKEN: Token = Token(0);
const FIRST_DYNAMIC_TOKEN: usize = 1;

/// One source registered with the poll beyond the control listener: either
/// an accepted control client or a raw receive descriptor belonging to a
/// `Hardware` entry, identified by interface name since `Hardware` entries
/// are recreated across rescans.
enum Source {
    Client(UnixStream),
    Raw { ifname: String, fd: RawFd },
}

/// The worker's single-threaded cooperative event loop (section 4.5.1):
/// one `mio::Poll` multiplexes the control-socket listener, accepted
/// control clients, and every `Hardware`'s raw receive descriptors, with
/// the discovery rescan driven off the poll timeout rather than a second
/// thread.
pub fn run(mut state: WorkerState) -> std::io::Result<()> {
    let log = state.log.clone();
    let _ = std::fs::remove_file(&state.config.socket);
    let mut listener = UnixListener::bind(&state.config.socket)?;

    let mut poll = Poll::new()?;
    poll.registry().register(&mut listener, CONTROL_TOKEN, Interest::READABLE)?;

    let mut sources: HashMap<Token, Source> = HashMap::new();
    let mut next_token = FIRST_DYNAMIC_TOKEN;
    let mut events = Events::with_capacity(1024);

    let interval = Duration::from_secs(state.config.interval_secs);
    info!(log, "worker started"; "socket" => state.config.socket.display().to_string(), "interval_secs" => state.config.interval_secs);

    if let Err(err) = state.rescan() {
        warn!(log, "initial rescan failed"; "error" => err.to_string());
    }
    register_raw_sources(&mut poll, &state, &mut sources, &mut next_token)?;

    let mut last_scan = Instant::now();

    loop {
        let elapsed = last_scan.elapsed();
        let timeout = interval.checked_sub(elapsed).unwrap_or(Duration::ZERO);
        if let Err(err) = poll.poll(&mut events, Some(timeout)) {
            if err.kind() == std::io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }

        for event in events.iter() {
            if event.token() == CONTROL_TOKEN {
                accept_clients(&mut listener, &mut poll, &mut sources, &mut next_token, &log);
                continue;
            }

            match sources.get_mut(&event.token()) {
                Some(Source::Client(stream)) => {
                    let mut std_stream: StdUnixStream = clone_std(stream);
                    control::handle_connection(&mut std_stream, &mut state, &log);
                    let _ = poll.registry().deregister(stream);
                    sources.remove(&event.token());
                }
                Some(Source::Raw { ifname, fd }) => {
                    let fd = *fd;
                    let ifname = ifname.clone();
                    drain_raw_source(&mut state, &ifname, fd, &log);
                }
                None => {}
            }
        }

        for table in state.neighbors.values_mut() {
            table.sweep_expired();
        }

        if last_scan.elapsed() >= interval {
            if let Err(err) = state.rescan() {
                error!(log, "rescan failed"; "error" => err.to_string());
            }
            deregister_raw_sources(&mut poll, &mut sources);
            register_raw_sources(&mut poll, &state, &mut sources, &mut next_token)?;
            last_scan = Instant::now();
        }
    }
}

fn accept_clients(
    listener: &mut UnixListener,
    poll: &mut Poll,
    sources: &mut HashMap<Token, Source>,
    next_token: &mut usize,
    log: &Logger,
) {
    loop {
        match listener.accept() {
            Ok((mut stream, _addr)) => {
                let token = Token(*next_token);
                *next_token += 1;
                if let Err(err) = poll.registry().register(&mut stream, token, Interest::READABLE) {
                    warn!(log, "failed to register control client"; "error" => err.to_string());
                    continue;
                }
                sources.insert(token, Source::Client(stream));
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => break,
            Err(err) => {
                warn!(log, "accept failed"; "error" => err.to_string());
                break;
            }
        }
    }
}

fn drain_raw_source(state: &mut WorkerState, ifname: &str, fd: RawFd, log: &Logger) {
    loop {
        let Some(hardware) = state.hardware.iter_mut().find(|hw| hw.ifname == ifname) else {
            return;
        };
        match rawio::recv_frame(hardware, fd) {
            Ok(Some(received)) => {
                hardware.counters.rx_cnt += 1;
                // Decoding the protocol's own TLVs out of `received.frame` and
                // upserting a neighbor entry is the announcement protocol's
                // concern, not this daemon's -- accepted frames are counted
                // and logged here, nothing more.
                info!(log, "frame received"; "ifname" => ifname, "len" => received.frame.len());
            }
            Ok(None) => {
                hardware.counters.rx_discarded_cnt += 1;
                return;
            }
            Err(err) => {
                warn!(log, "recv failed"; "ifname" => ifname, "error" => err.to_string());
                return;
            }
        }
    }
}

fn register_raw_sources(
    poll: &mut Poll,
    state: &WorkerState,
    sources: &mut HashMap<Token, Source>,
    next_token: &mut usize,
) -> std::io::Result<()> {
    for hardware in &state.hardware {
        for &fd in &hardware.recv_fds {
            let token = Token(*next_token);
            *next_token += 1;
            let mut source_fd = SourceFd(&fd);
            poll.registry().register(&mut source_fd, token, Interest::READABLE)?;
            sources.insert(token, Source::Raw { ifname: hardware.ifname.clone(), fd });
        }
    }
    Ok(())
}

fn deregister_raw_sources(poll: &mut Poll, sources: &mut HashMap<Token, Source>) {
    sources.retain(|_, source| match source {
        Source::Raw { fd, .. } => {
            let mut source_fd = SourceFd(fd);
            let _ = poll.registry().deregister(&mut source_fd);
            false
        }
        Source::Client(_) => true,
    });
}

fn clone_std(stream: &UnixStream) -> StdUnixStream {
    use std::os::unix::io::FromRawFd;
    let raw = stream.as_raw_fd();
    let duped = nix::unistd::dup(raw).expect("dup of control client fd failed");
    unsafe { StdUnixStream::from_raw_fd(duped) }
}
