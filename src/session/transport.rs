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

use std::io;
use std::io::Write;
use std::net::TcpStream;
use std::net::ToSocketAddrs;
use std::time::Duration;

use native_tls::TlsConnector;
use native_tls::TlsStream;

use super::sys;

/// TLS settings of a [`Session`](super::Session).
///
/// The connector is built by the caller (trust store, client identity, verification
/// switches) and used as is.
///
/// # Examples
///
/// ```
/// use logforth_gelf::session::TlsConfig;
///
/// let connector = native_tls::TlsConnector::new().unwrap();
/// let tls = TlsConfig::new(connector).with_domain("graylog.example.com");
/// ```
#[derive(Debug, Clone)]
pub struct TlsConfig {
    connector: TlsConnector,
    domain: Option<String>,
}

impl TlsConfig {
    /// Create a TLS configuration from a prepared connector.
    pub fn new(connector: TlsConnector) -> Self {
        Self {
            connector,
            domain: None,
        }
    }

    /// Set the domain presented during the handshake and checked against the certificate.
    ///
    /// Default to the host part of the session address.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    fn domain<'a>(&'a self, address: &'a str) -> &'a str {
        match self.domain {
            Some(ref domain) => domain,
            None => host_part(address),
        }
    }
}

fn host_part(address: &str) -> &str {
    let host = match address.rsplit_once(':') {
        Some((host, _)) => host,
        None => address,
    };
    host.trim_start_matches('[').trim_end_matches(']')
}

#[derive(Debug, Clone)]
pub(super) struct TransportOptions {
    pub(super) connect_timeout: Duration,
    pub(super) keepalive: Option<Duration>,
    pub(super) write_timeout: Option<Duration>,
}

/// A live connection to the collector.
#[derive(Debug)]
pub(super) enum Connection {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl Connection {
    fn tcp(&self) -> &TcpStream {
        match self {
            Connection::Plain(stream) => stream,
            Connection::Tls(stream) => stream.get_ref(),
        }
    }

    /// Write a full buffer and flush it to the socket.
    pub(super) fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            Connection::Plain(stream) => {
                stream.write_all(buf)?;
                stream.flush()
            }
            Connection::Tls(stream) => {
                stream.write_all(buf)?;
                stream.flush()
            }
        }
    }

    /// Best-effort check that the connection is still usable.
    ///
    /// A zero-length write catches sockets the local stack already knows are broken. A
    /// non-blocking peek then catches a FIN or RST that has already arrived from the peer.
    /// A peer that vanished without sending either still reads as alive here; the next
    /// failed write is what catches it.
    pub(super) fn is_alive(&mut self) -> bool {
        let probe = match self {
            Connection::Plain(stream) => stream.write(&[]),
            Connection::Tls(stream) => stream.write(&[]),
        };
        probe.is_ok() && peer_open(self.tcp())
    }
}

fn peer_open(stream: &TcpStream) -> bool {
    if stream.set_nonblocking(true).is_err() {
        return false;
    }
    let mut buf = [0u8; 1];
    let peeked = stream.peek(&mut buf);
    if stream.set_nonblocking(false).is_err() {
        return false;
    }

    match peeked {
        // orderly shutdown from the peer
        Ok(0) => false,
        Ok(_) => true,
        Err(err) => matches!(
            err.kind(),
            io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
        ),
    }
}

/// Establish a connection to `address`, wrapping it in TLS when `tls` is set.
pub(super) fn dial(
    address: &str,
    tls: Option<&TlsConfig>,
    options: &TransportOptions,
) -> io::Result<Connection> {
    let stream = connect_tcp(address, options.connect_timeout)?;
    if let Some(keepalive) = options.keepalive {
        sys::set_keepalive(&stream, keepalive)?;
    }

    match tls {
        None => {
            stream.set_write_timeout(options.write_timeout)?;
            Ok(Connection::Plain(stream))
        }
        Some(tls) => {
            // bound the handshake by the connect timeout
            stream.set_read_timeout(Some(options.connect_timeout))?;
            stream.set_write_timeout(Some(options.connect_timeout))?;
            let stream = tls
                .connector
                .connect(tls.domain(address), stream)
                .map_err(io::Error::other)?;
            let tcp = stream.get_ref();
            tcp.set_read_timeout(None)?;
            tcp.set_write_timeout(options.write_timeout)?;
            Ok(Connection::Tls(Box::new(stream)))
        }
    }
}

fn connect_tcp(address: &str, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in address.to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                stream.set_nodelay(true)?;
                return Ok(stream);
            }
            Err(err) => last_err = Some(err),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("could not resolve any address for {address}"),
        )
    }))
}

#[cfg(test)]
mod tests {
    use std::net::Shutdown;
    use std::net::TcpListener;

    use super::*;

    fn options() -> TransportOptions {
        TransportOptions {
            connect_timeout: Duration::from_secs(1),
            keepalive: Some(Duration::from_secs(30)),
            write_timeout: None,
        }
    }

    #[test]
    fn host_part_strips_port_and_brackets() {
        assert_eq!(host_part("graylog.example.com:12201"), "graylog.example.com");
        assert_eq!(host_part("[::1]:12201"), "::1");
        assert_eq!(host_part("localhost"), "localhost");
    }

    #[test]
    fn explicit_domain_wins() {
        let tls = TlsConfig::new(TlsConnector::new().unwrap()).with_domain("collector");
        assert_eq!(tls.domain("10.0.0.1:12201"), "collector");
    }

    #[test]
    fn unresolvable_address_fails() {
        assert!(dial("invalid:address", None, &options()).is_err());
    }

    #[test]
    fn probe_detects_peer_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let mut conn = dial(&address, None, &options()).unwrap();
        let (peer, _) = listener.accept().unwrap();

        assert!(conn.is_alive());

        peer.shutdown(Shutdown::Both).unwrap();
        drop(peer);
        // loopback delivers the FIN before shutdown returns, but give slow CI a moment
        let mut alive = true;
        for _ in 0..50 {
            alive = conn.is_alive();
            if !alive {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(!alive);
    }

    #[test]
    fn probe_ignores_unsolicited_peer_data() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let mut conn = dial(&address, None, &options()).unwrap();
        let (mut peer, _) = listener.accept().unwrap();

        peer.write_all(b"x").unwrap();
        std::thread::sleep(Duration::from_millis(20));
        assert!(conn.is_alive());
        assert!(conn.is_alive());
    }
}
