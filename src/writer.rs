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
use std::sync::Arc;

use serde_json::Map;
use serde_json::Value;

use crate::Error;
use crate::ErrorKind;
use crate::Session;
use crate::encoder::GelfEncoder;
use crate::processor::MESSAGE_FIELD;

/// Ships serialized JSON events to a [`Session`].
///
/// This is the entry point for logging layers that already render events as JSON objects.
/// The writer is cheap to clone; clones share the session.
///
/// # Examples
///
/// ```rust, no_run
/// use std::io::Write;
/// use std::sync::Arc;
///
/// use logforth_gelf::GelfWriter;
/// use logforth_gelf::Session;
///
/// let session = Arc::new(Session::open("127.0.0.1:12201", None).unwrap());
/// let mut writer = GelfWriter::new(session);
/// writer.write_all(br#"{"message":"hello","level":"info","user":"ada"}"#).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct GelfWriter {
    session: Arc<Session>,
    encoder: GelfEncoder,
}

impl GelfWriter {
    /// Create a writer shipping to `session`.
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            encoder: GelfEncoder,
        }
    }

    /// The session records are shipped to.
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Decode, encode and ship one event.
    ///
    /// Returns the length of `event` on success: the count of input consumed, not the size
    /// of the encoded record.
    ///
    /// # Errors
    ///
    /// * [`Decode`](ErrorKind::Decode) if `event` is not a JSON object.
    /// * [`Validation`](ErrorKind::Validation) if `message` is missing or not a string, or the
    ///   field processor rejects the event.
    /// * [`Connection`](ErrorKind::Connection) if the collector cannot be reached.
    /// * [`Serialization`](ErrorKind::Serialization) if the record cannot be encoded.
    pub fn write_event(&self, event: &[u8]) -> Result<usize, Error> {
        let original: Map<String, Value> = serde_json::from_slice(event).map_err(|err| {
            Error::new(ErrorKind::Decode, "event is not a JSON object").with_source(err)
        })?;
        let short_message = match original.get(MESSAGE_FIELD) {
            Some(Value::String(message)) => message.as_str(),
            Some(other) => {
                return Err(Error::validation("field `message` is not a string")
                    .with_context("message", other));
            }
            None => return Err(Error::validation("field `message` is missing")),
        };

        self.session.ensure_alive()?;

        let mut fields = original.clone();
        let processed = self.session.processor().process(&mut fields)?;
        let record =
            self.encoder
                .encode(short_message, &original, self.session.host(), &processed)?;
        self.session.send(&record)?;

        Ok(event.len())
    }
}

impl io::Write for GelfWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_event(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Write for &GelfWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_event(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
