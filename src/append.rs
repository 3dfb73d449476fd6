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

//! Dispatch log records to various targets.

use std::fmt;

use log::Record;

use crate::Error;
use crate::GelfWriter;
use crate::layout::JsonEventLayout;
use crate::layout::Layout;

/// An appender that can process log records.
pub trait Append: fmt::Debug + Send + Sync + 'static {
    /// Dispatch a log record to the append target.
    fn append(&self, record: &Record) -> Result<(), Error>;

    /// Flush any buffered records.
    ///
    /// Default to a no-op.
    fn flush(&self) -> Result<(), Error> {
        Ok(())
    }
}

impl<T: Append> From<T> for Box<dyn Append> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// An appender that ships log records to a GELF collector.
///
/// Records emitted by this crate itself are skipped: they are produced while a session lock
/// is held and shipping them would re-enter that lock.
///
/// # Examples
///
/// ```rust, no_run
/// use std::sync::Arc;
///
/// use logforth_gelf::GelfWriter;
/// use logforth_gelf::Session;
/// use logforth_gelf::append::Gelf;
///
/// let session = Arc::new(Session::open("127.0.0.1:12201", None).unwrap());
///
/// logforth_gelf::builder()
///     .filter(log::LevelFilter::Info)
///     .append(Gelf::new(GelfWriter::new(session)))
///     .apply();
///
/// log::info!(user = "ada"; "signed in");
/// ```
#[derive(Debug)]
pub struct Gelf {
    writer: GelfWriter,
    layout: Box<dyn Layout>,
}

impl Gelf {
    /// Create a new `Gelf` appender shipping through `writer`.
    pub fn new(writer: GelfWriter) -> Self {
        Self {
            writer,
            layout: Box::new(JsonEventLayout::default()),
        }
    }

    /// Set the layout rendering records into events.
    ///
    /// The layout must produce a JSON object with a string `message` field. Default to
    /// [`JsonEventLayout`].
    pub fn with_layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }
}

fn is_internal(target: &str) -> bool {
    let name = env!("CARGO_CRATE_NAME");
    target
        .strip_prefix(name)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

impl Append for Gelf {
    fn append(&self, record: &Record) -> Result<(), Error> {
        if is_internal(record.target()) {
            return Ok(());
        }
        let event = self.layout.format(record)?;
        self.writer.write_event(&event)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_targets_are_recognized() {
        assert!(is_internal("logforth_gelf"));
        assert!(is_internal("logforth_gelf::session"));
        assert!(!is_internal("logforth_gelfish"));
        assert!(!is_internal("billing"));
    }
}
