// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![allow(dead_code)]

use std::io;
use std::io::Read;
use std::net::Shutdown;
use std::net::SocketAddr;
use std::net::TcpListener;
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;
use std::time::Instant;

use native_tls::Identity;
use native_tls::TlsAcceptor;
use serde_json::Value;

pub const CERT_PEM: &[u8] = include_bytes!("../data/cert.pem");
pub const KEY_PEM: &[u8] = include_bytes!("../data/key.pem");

/// A GELF collector stand-in that accepts any number of connections and records every byte
/// it receives.
pub struct MockCollector {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<u8>>>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl MockCollector {
    pub fn start() -> Self {
        Self::bind(SocketAddr::from(([127, 0, 0, 1], 0)), None)
    }

    pub fn start_tls() -> Self {
        let identity = Identity::from_pkcs8(CERT_PEM, KEY_PEM).unwrap();
        let acceptor = TlsAcceptor::new(identity).unwrap();
        Self::bind(SocketAddr::from(([127, 0, 0, 1], 0)), Some(acceptor))
    }

    /// Listen again on the address of a stopped collector.
    pub fn restart(addr: SocketAddr) -> Self {
        Self::bind(addr, None)
    }

    fn bind(addr: SocketAddr, tls: Option<TlsAcceptor>) -> Self {
        let listener = TcpListener::bind(addr).unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();

        let received = Arc::new(Mutex::new(Vec::new()));
        let stop = Arc::new(AtomicBool::new(false));
        let handle = {
            let received = received.clone();
            let stop = stop.clone();
            thread::spawn(move || accept_loop(listener, tls, received, stop))
        };

        Self {
            addr,
            received,
            stop,
            handle: Some(handle),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    /// Every byte received so far, across all connections.
    pub fn raw(&self) -> Vec<u8> {
        self.received.lock().unwrap().clone()
    }

    /// Wait until at least `expected` JSON documents arrived, then return all of them.
    ///
    /// Records may be delimited by nothing, whitespace, or null bytes.
    pub fn records(&self, expected: usize) -> Vec<Value> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let records = parse_records(&self.raw());
            if records.len() >= expected || Instant::now() >= deadline {
                return records;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }

    /// Close the listener and every accepted connection, and wait for both to be gone.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.join().unwrap();
        }
    }
}

impl Drop for MockCollector {
    fn drop(&mut self) {
        self.stop();
    }
}

fn accept_loop(
    listener: TcpListener,
    tls: Option<TlsAcceptor>,
    received: Arc<Mutex<Vec<u8>>>,
    stop: Arc<AtomicBool>,
) {
    let mut peers: Vec<TcpStream> = vec![];
    let mut readers = vec![];

    while !stop.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, _)) => {
                stream.set_nonblocking(false).unwrap();
                peers.push(stream.try_clone().unwrap());
                let received = received.clone();
                let tls = tls.clone();
                readers.push(thread::spawn(move || match tls {
                    Some(acceptor) => {
                        if let Ok(stream) = acceptor.accept(stream) {
                            drain(stream, &received);
                        }
                    }
                    None => drain(stream, &received),
                }));
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(5));
            }
            Err(err) => panic!("accept failed: {err}"),
        }
    }

    for peer in &peers {
        let _ = peer.shutdown(Shutdown::Both);
    }
    for reader in readers {
        let _ = reader.join();
    }
}

fn drain(mut stream: impl Read, received: &Mutex<Vec<u8>>) {
    let mut buf = [0u8; 4096];
    loop {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => received.lock().unwrap().extend_from_slice(&buf[..n]),
        }
    }
}

fn parse_records(raw: &[u8]) -> Vec<Value> {
    let cleaned: Vec<u8> = raw
        .iter()
        .map(|&b| if b == 0 { b'\n' } else { b })
        .collect();
    serde_json::Deserializer::from_slice(&cleaned)
        .into_iter::<Value>()
        .map_while(Result::ok)
        .collect()
}
