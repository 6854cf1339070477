#![allow(dead_code)]
//! Test harness utilities for lumen-net integration tests.

use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use lumen_core::Registry;
use lumen_net::osc::{decode_message, encode_message, flatten};
use lumen_net::{OscBridge, RateLimiter};
use lumen_types::Value;

pub fn unlimited() -> RateLimiter {
    RateLimiter::new(usize::MAX, Duration::from_millis(20))
}

pub fn bind_bridge(feedback: Option<SocketAddr>, limiter: RateLimiter) -> OscBridge {
    let listen: SocketAddr = "127.0.0.1:0".parse().unwrap();
    OscBridge::bind(listen, feedback, limiter).unwrap()
}

/// A UDP peer standing in for a control surface.
pub struct RawController {
    socket: UdpSocket,
}

impl RawController {
    pub fn new() -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        Self { socket }
    }

    pub fn addr(&self) -> SocketAddr {
        self.socket.local_addr().unwrap()
    }

    pub fn send(&self, to: SocketAddr, address: &str, args: &[Value]) {
        let buf = encode_message(address, args).unwrap();
        self.socket.send_to(&buf, to).unwrap();
    }

    pub fn send_raw(&self, to: SocketAddr, buf: &[u8]) {
        self.socket.send_to(buf, to).unwrap();
    }

    /// Next message, or panic after the read timeout.
    pub fn recv(&self) -> (String, Vec<Value>) {
        let mut buf = [0u8; 4096];
        let (n, from) = self.socket.recv_from(&mut buf).unwrap();
        let (_, packet) = rosc::decoder::decode_udp(&buf[..n]).unwrap();
        let mut messages = Vec::new();
        flatten(packet, &mut messages);
        let msg = decode_message(messages.remove(0), from).unwrap();
        (msg.address, msg.args)
    }

    pub fn try_recv(&self, wait: Duration) -> Option<(String, Vec<Value>)> {
        self.socket.set_read_timeout(Some(wait)).unwrap();
        let mut buf = [0u8; 4096];
        let result = self.socket.recv_from(&mut buf).ok().map(|(n, from)| {
            let (_, packet) = rosc::decoder::decode_udp(&buf[..n]).unwrap();
            let mut messages = Vec::new();
            flatten(packet, &mut messages);
            let msg = decode_message(messages.remove(0), from).unwrap();
            (msg.address, msg.args)
        });
        self.socket.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        result
    }
}

/// Poll the bridge until `done` holds, or panic after `timeout`.
pub fn drive_until(bridge: &mut OscBridge, registry: &Registry, timeout: Duration, done: impl Fn() -> bool) {
    let start = Instant::now();
    while start.elapsed() < timeout {
        bridge.poll(registry);
        if done() {
            return;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("timed out after {:?} waiting for the bridge", timeout);
}
