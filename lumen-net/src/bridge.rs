//! UDP bridge between OSC controllers and the registry.
//!
//! A listener thread decodes packets and hands messages over a bounded
//! channel. Everything that touches the registry (dispatch, queries, change
//! notifications) happens on the tick thread via `poll` and `flush`.

use std::cell::RefCell;
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use lumen_core::parameter::ListenerId;
use lumen_core::registry::is_pattern;
use lumen_core::Registry;
use lumen_types::Value;

use crate::osc::{decode_message, encode_message, flatten, InboundMessage};
use crate::outbound::OutboundQueue;
use crate::rate_limit::RateLimiter;

/// Prefix that turns an address into a value query.
pub const QUERY_PREFIX: &str = "/get";

/// Inbound messages waiting for the next tick. Excess is dropped with a warning.
const INBOUND_CAPACITY: usize = 1024;

const RECV_TIMEOUT: Duration = Duration::from_millis(50);

pub struct OscBridge {
    socket: UdpSocket,
    feedback: Option<SocketAddr>,
    inbound: Receiver<InboundMessage>,
    shutdown: Arc<AtomicBool>,
    listener: Option<JoinHandle<()>>,
    outbound: Rc<RefCell<OutboundQueue>>,
    limiter: RateLimiter,
    attached: Option<(Weak<Registry>, ListenerId)>,
}

impl OscBridge {
    /// Bind `listen` and start the receive thread. Outbound feedback goes to
    /// `feedback` when set.
    pub fn bind(listen: SocketAddr, feedback: Option<SocketAddr>, limiter: RateLimiter) -> io::Result<Self> {
        let socket = UdpSocket::bind(listen)?;
        let recv_socket = socket.try_clone()?;
        recv_socket.set_read_timeout(Some(RECV_TIMEOUT))?;

        let (tx, rx) = crossbeam_channel::bounded(INBOUND_CAPACITY);
        let shutdown = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&shutdown);
        let listener = thread::Builder::new()
            .name("osc-listen".into())
            .spawn(move || receive_loop(recv_socket, tx, stop))?;

        log::info!(target: "net::osc", "listening on {}", socket.local_addr()?);
        Ok(Self {
            socket,
            feedback,
            inbound: rx,
            shutdown,
            listener: Some(listener),
            outbound: Rc::new(RefCell::new(OutboundQueue::new())),
            limiter,
            attached: None,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn feedback(&self) -> Option<SocketAddr> {
        self.feedback
    }

    pub fn pending_outbound(&self) -> usize {
        self.outbound.borrow().len()
    }

    /// Queue every parameter change of `registry` for feedback. Replaces any
    /// previous attachment.
    pub fn attach(&mut self, registry: &Rc<Registry>) {
        self.detach();
        let queue = Rc::clone(&self.outbound);
        let id = registry.subscribe_changes(move |address, value| {
            queue.borrow_mut().push(address, value.clone());
        });
        self.attached = Some((Rc::downgrade(registry), id));
    }

    pub fn detach(&mut self) {
        if let Some((registry, id)) = self.attached.take() {
            if let Some(registry) = registry.upgrade() {
                registry.unsubscribe_changes(id);
            }
        }
    }

    /// Apply every message received since the last call. Returns how many
    /// were handled.
    pub fn poll(&mut self, registry: &Registry) -> usize {
        let mut handled = 0;
        loop {
            match self.inbound.try_recv() {
                Ok(msg) => {
                    self.handle(registry, msg);
                    handled += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::warn!(target: "net::osc", "listener thread has stopped");
                    break;
                }
            }
        }
        handled
    }

    fn handle(&self, registry: &Registry, msg: InboundMessage) {
        log::trace!(target: "net::osc", "{} {:?} from {}", msg.address, msg.args, msg.from);
        if let Some(target) = query_target(registry, &msg.address) {
            let reply_to = self.feedback.unwrap_or(msg.from);
            match registry.get_fx(target) {
                Some(value) => self.send(reply_to, target, &[value]),
                None => log::debug!(target: "net::osc", "query for {} has no answer", target),
            }
        } else if is_pattern(&msg.address) {
            let delivered = registry.dispatch_pattern(&msg.address, &msg.args);
            log::debug!(target: "net::osc", "{} matched {} element(s)", msg.address, delivered);
        } else {
            registry.set_fx_args(&msg.address, &msg.args);
        }
    }

    /// Send queued changes to the feedback target, within the rate limit.
    /// Without a feedback target the queue is discarded. Returns how many
    /// messages were sent.
    pub fn flush(&mut self, now: Instant) -> usize {
        let Some(target) = self.feedback else {
            self.outbound.borrow_mut().clear();
            return 0;
        };
        let wanted = self.outbound.borrow().len();
        let granted = self.limiter.take(now, wanted);
        let mut sent = 0;
        for _ in 0..granted {
            let Some((address, value)) = self.outbound.borrow_mut().pop() else {
                break;
            };
            self.send(target, &address, &[value]);
            sent += 1;
        }
        sent
    }

    fn send(&self, to: SocketAddr, address: &str, args: &[Value]) {
        let buf = match encode_message(address, args) {
            Ok(buf) => buf,
            Err(e) => {
                log::warn!(target: "net::osc", "encode {}: {:?}", address, e);
                return;
            }
        };
        if let Err(e) = self.socket.send_to(&buf, to) {
            log::warn!(target: "net::osc", "send {} to {}: {}", address, to, e);
        }
    }
}

impl Drop for OscBridge {
    fn drop(&mut self) {
        self.detach();
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.listener.take() {
            let _ = handle.join();
        }
    }
}

/// `/get/a/b` asks for the value at `/a/b`, unless `/get/a/b` is itself registered.
fn query_target<'a>(registry: &Registry, address: &'a str) -> Option<&'a str> {
    let target = address.strip_prefix(QUERY_PREFIX)?;
    if !target.starts_with('/') || registry.contains(address) {
        return None;
    }
    Some(target)
}

fn receive_loop(socket: UdpSocket, tx: Sender<InboundMessage>, shutdown: Arc<AtomicBool>) {
    let mut buf = [0u8; 4096];
    let mut messages = Vec::new();
    while !shutdown.load(Ordering::Relaxed) {
        let (n, from) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(ref e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => continue,
            Err(e) => {
                log::error!(target: "net::osc", "receive failed: {}", e);
                break;
            }
        };
        let packet = match rosc::decoder::decode_udp(&buf[..n]) {
            Ok((_, packet)) => packet,
            Err(e) => {
                log::warn!(target: "net::osc", "undecodable packet from {}: {:?}", from, e);
                continue;
            }
        };
        flatten(packet, &mut messages);
        for msg in messages.drain(..) {
            let inbound = match decode_message(msg, from) {
                Ok(inbound) => inbound,
                Err(e) => {
                    log::warn!(target: "net::osc", "dropped message: {}", e);
                    continue;
                }
            };
            match tx.try_send(inbound) {
                Ok(()) => {}
                Err(TrySendError::Full(m)) => {
                    log::warn!(target: "net::osc", "inbound queue full, dropped {}", m.address);
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }
}
