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

use std::io::Write;

use log::Metadata;
use log::Record;

use crate::Error;
use crate::append::Append;
use crate::filter::EnvFilter;

/// A logger facade that dispatches log records to one or more dispatches.
///
/// This struct implements [`log::Log`] so that records of the [`log`] crate reach the
/// configured appenders. Build one with [`builder`](crate::builder).
#[derive(Debug)]
pub struct Logger {
    dispatches: Vec<Dispatch>,
}

impl Logger {
    pub(super) fn new(dispatches: Vec<Dispatch>) -> Self {
        Self { dispatches }
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.dispatches
            .iter()
            .any(|dispatch| dispatch.enabled(metadata))
    }

    fn log(&self, record: &Record) {
        for dispatch in &self.dispatches {
            if dispatch.matches(record) {
                if let Err(err) = dispatch.log(record) {
                    handle_log_error(record, err);
                }
            }
        }
    }

    fn flush(&self) {
        for dispatch in &self.dispatches {
            if let Err(err) = dispatch.flush() {
                handle_flush_error(err);
            }
        }
    }
}

/// A filter together with the appenders it guards.
#[derive(Debug)]
pub(super) struct Dispatch {
    filter: EnvFilter,
    appends: Vec<Box<dyn Append>>,
}

impl Dispatch {
    pub(super) fn new(filter: EnvFilter, appends: Vec<Box<dyn Append>>) -> Self {
        debug_assert!(
            !appends.is_empty(),
            "A Dispatch must have at least one append"
        );

        Self { filter, appends }
    }

    fn enabled(&self, metadata: &Metadata) -> bool {
        self.filter.enabled(metadata)
    }

    fn matches(&self, record: &Record) -> bool {
        self.filter.matches(record)
    }

    fn log(&self, record: &Record) -> Result<(), Error> {
        for append in &self.appends {
            append.append(record)?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), Error> {
        for append in &self.appends {
            append.flush()?;
        }
        Ok(())
    }
}

// The log facade has no caller to hand errors back to, so they end up on stderr.
fn handle_log_error(record: &Record, error: Error) {
    let _ = write!(
        std::io::stderr(),
        r###"
Error perform logging.
    Attempted to log: {args}
    Record: {record:?}
    Error: {error:?}
"###,
        args = record.args(),
        record = record,
        error = error,
    );
}

fn handle_flush_error(error: Error) {
    let _ = write!(
        std::io::stderr(),
        r###"
Error perform flush.
    Error: {error:?}
"###,
    );
}
