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

//! A long-lived connection to a GELF collector.
//!
//! # Examples
//!
//! ```rust, no_run
//! use std::time::Duration;
//!
//! use logforth_gelf::session::Framing;
//! use logforth_gelf::session::Session;
//!
//! let session = Session::builder("graylog.example.com:12201")
//!     .connect_timeout(Duration::from_secs(2))
//!     .framing(Framing::NullByte)
//!     .connect()
//!     .unwrap();
//! session.send(br#"{"version":"1.1","host":"h","short_message":"hi"}"#).unwrap();
//! ```

use std::borrow::Cow;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use crate::Error;
use crate::processor::FieldProcessor;
use crate::processor::StandardFieldProcessor;

mod sys;
mod transport;

use self::transport::Connection;
use self::transport::TransportOptions;
pub use self::transport::TlsConfig;

/// Default bound on establishing a connection, TLS handshake included.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default TCP keep-alive interval.
pub const DEFAULT_KEEPALIVE: Duration = Duration::from_secs(30);

/// How consecutive records are delimited on the stream.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Records are written back to back with no delimiter.
    #[default]
    None,
    /// Every record is followed by a `\0` byte, as Graylog's GELF TCP input expects.
    NullByte,
}

impl Framing {
    fn frame<'a>(&self, payload: &'a [u8]) -> Cow<'a, [u8]> {
        match self {
            Framing::None => Cow::Borrowed(payload),
            Framing::NullByte => {
                let mut framed = Vec::with_capacity(payload.len() + 1);
                framed.extend_from_slice(payload);
                framed.push(0);
                Cow::Owned(framed)
            }
        }
    }
}

/// A connection to one collector, shared by every writer that ships to it.
///
/// All connection state changes and writes happen under a single lock, so at most one write
/// is in flight and the connection is swapped atomically. Reconnects are driven by callers;
/// there is no background retry.
#[derive(Debug)]
pub struct Session {
    address: String,
    tls: Option<TlsConfig>,
    options: TransportOptions,
    framing: Framing,
    host: String,
    processor: Box<dyn FieldProcessor>,
    connection: Mutex<Option<Connection>>,
}

impl Session {
    /// Connect to `address` (`host:port`), over TLS when `tls` is set, with default options.
    pub fn open(address: impl Into<String>, tls: Option<TlsConfig>) -> Result<Session, Error> {
        let builder = SessionBuilder::new(address);
        match tls {
            Some(tls) => builder.tls(tls).connect(),
            None => builder.connect(),
        }
    }

    /// Create a [`SessionBuilder`] for `address`.
    pub fn builder(address: impl Into<String>) -> SessionBuilder {
        SessionBuilder::new(address)
    }

    /// The collector address this session dials.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The host identity written into every record.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Whether connections are wrapped in TLS.
    pub fn is_tls(&self) -> bool {
        self.tls.is_some()
    }

    /// The field processor chosen for this session.
    pub fn processor(&self) -> &dyn FieldProcessor {
        self.processor.as_ref()
    }

    /// Whether a connection is currently held.
    ///
    /// This does not probe the connection.
    pub fn is_connected(&self) -> bool {
        self.connection().is_some()
    }

    fn connection(&self) -> MutexGuard<'_, Option<Connection>> {
        self.connection.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn dial(&self) -> Result<Connection, Error> {
        log::debug!("dialing collector at {}", self.address);
        transport::dial(&self.address, self.tls.as_ref(), &self.options).map_err(|err| {
            Error::connection("failed to connect to collector", err)
                .with_context("address", &self.address)
        })
    }

    /// Make sure a usable connection is held, dialing a new one if needed.
    ///
    /// An existing connection is checked with a best-effort probe: a zero-length write, then a
    /// non-blocking peek for a FIN or RST the peer already sent. A peer that disappeared
    /// silently still passes the probe and is only noticed by the next [`send`](Self::send).
    /// A failed probe causes a redial. When dialing fails the session is left disconnected
    /// and the next call tries again.
    pub fn ensure_alive(&self) -> Result<(), Error> {
        let mut connection = self.connection();
        if let Some(conn) = connection.as_mut() {
            if conn.is_alive() {
                return Ok(());
            }
            log::debug!("connection to {} is gone, redialing", self.address);
        }

        *connection = None;
        *connection = Some(self.dial()?);
        Ok(())
    }

    /// Write one payload, framed per [`Framing`], and return the number of bytes written.
    ///
    /// If the write fails the session reconnects once and retries the write once. If the
    /// retry fails too, the error is returned and the session is left disconnected.
    pub fn send(&self, payload: &[u8]) -> Result<usize, Error> {
        let frame = self.framing.frame(payload);
        let mut connection = self.connection();

        let written = match connection.as_mut() {
            Some(conn) => conn.write_all(&frame),
            None => Err(std::io::ErrorKind::NotConnected.into()),
        };
        if written.is_err() {
            log::debug!("write to {} failed, reconnecting", self.address);
            *connection = None;
            let conn = connection.insert(self.dial()?);
            if let Err(err) = conn.write_all(&frame) {
                *connection = None;
                return Err(Error::connection("failed to write record", err)
                    .with_context("address", &self.address)
                    .with_context("retried", true));
            }
        }

        Ok(frame.len())
    }
}

/// A builder for configuring a [`Session`].
///
/// # Examples
///
/// ```rust, no_run
/// use logforth_gelf::level::ZapLevels;
/// use logforth_gelf::processor::StandardFieldProcessor;
/// use logforth_gelf::session::SessionBuilder;
///
/// let session = SessionBuilder::new("127.0.0.1:12201")
///     .host("billing-worker")
///     .processor(StandardFieldProcessor::new(ZapLevels))
///     .connect()
///     .unwrap();
/// ```
#[must_use = "call `connect` to open the session"]
#[derive(Debug)]
pub struct SessionBuilder {
    address: String,
    tls: Option<TlsConfig>,
    options: TransportOptions,
    framing: Framing,
    host: Option<String>,
    processor: Box<dyn FieldProcessor>,
}

impl SessionBuilder {
    /// Create a new builder for `address` (`host:port`).
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            tls: None,
            options: TransportOptions {
                connect_timeout: DEFAULT_CONNECT_TIMEOUT,
                keepalive: Some(DEFAULT_KEEPALIVE),
                write_timeout: None,
            },
            framing: Framing::default(),
            host: None,
            processor: Box::new(StandardFieldProcessor::default()),
        }
    }

    /// Wrap connections in TLS.
    pub fn tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Set the bound on dialing and the TLS handshake.
    ///
    /// Default to [`DEFAULT_CONNECT_TIMEOUT`].
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.options.connect_timeout = timeout;
        self
    }

    /// Set the TCP keep-alive interval, or `None` to leave keep-alive off.
    ///
    /// Default to [`DEFAULT_KEEPALIVE`].
    pub fn keepalive(mut self, interval: Option<Duration>) -> Self {
        self.options.keepalive = interval;
        self
    }

    /// Bound every socket write.
    ///
    /// Default to no bound: a stalled collector blocks the writing thread, and every thread
    /// waiting on the session, until the operating system gives up.
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.options.write_timeout = Some(timeout);
        self
    }

    /// Set the record delimiter.
    ///
    /// Default to [`Framing::None`].
    pub fn framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }

    /// Override the host identity written into records.
    ///
    /// Default to the name of this machine.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the field processor.
    ///
    /// Default to [`StandardFieldProcessor`] with [`LogLevels`](crate::level::LogLevels).
    pub fn processor(mut self, processor: impl Into<Box<dyn FieldProcessor>>) -> Self {
        self.processor = processor.into();
        self
    }

    /// Dial the collector and return the connected session.
    ///
    /// # Errors
    ///
    /// Returns a [`Connection`](crate::ErrorKind::Connection) error if the address cannot be
    /// resolved or reached, or the TLS handshake fails. No retry is attempted.
    pub fn connect(self) -> Result<Session, Error> {
        let session = Session {
            address: self.address,
            tls: self.tls,
            options: self.options,
            framing: self.framing,
            host: self.host.unwrap_or_else(sys::hostname),
            processor: self.processor,
            connection: Mutex::new(None),
        };

        let conn = session.dial()?;
        *session.connection() = Some(conn);
        Ok(session)
    }
}
