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

use log::LevelFilter;

use super::log_impl::Dispatch;
use super::log_impl::Logger;
use crate::append::Append;
use crate::filter::EnvFilter;

/// Create a new empty [builder][Builder].
///
/// At least one append must be added before the logger can be applied:
///
/// ```rust, no_run
/// use std::sync::Arc;
///
/// use log::LevelFilter;
/// use logforth_gelf::GelfWriter;
/// use logforth_gelf::Session;
/// use logforth_gelf::append::Gelf;
///
/// let session = Arc::new(Session::open("127.0.0.1:12201", None).unwrap());
///
/// logforth_gelf::builder()
///     // .apply()  CANNOT COMPILE: a staging dispatch without Append
///     .filter(LevelFilter::Info)
///     .append(Gelf::new(GelfWriter::new(session)))
///     .apply();
/// ```
///
/// Multiple dispatches tee the same records to several destinations:
///
/// ```rust, no_run
/// use std::sync::Arc;
///
/// use log::LevelFilter;
/// use logforth_gelf::GelfWriter;
/// use logforth_gelf::Session;
/// use logforth_gelf::append::Gelf;
///
/// let audit = Arc::new(Session::open("audit.example.com:12201", None).unwrap());
/// let ops = Arc::new(Session::open("ops.example.com:12201", None).unwrap());
///
/// logforth_gelf::builder()
///     .filter(LevelFilter::Warn)
///     .append(Gelf::new(GelfWriter::new(audit)))
///     .dispatch() // finish the current dispatch and start a new staging dispatch
///     .filter(LevelFilter::Debug)
///     .append(Gelf::new(GelfWriter::new(ops)))
///     .apply();
/// ```
pub fn builder() -> Builder<false> {
    Builder::default()
}

/// A builder for configuring the logger. See also [`builder`] for a fluent API.
///
/// * `READY=false`: The initialized state. You can configure the filter and [`Append`]s
///   for the current staging dispatch. Once at least one append is configured, the builder
///   transits to `READY=true`.
/// * `READY=true`: The builder can be [applied][Builder::apply] to set up the global logger.
///   Or, you can start a new staging dispatch by calling [dispatch][Builder::dispatch].
#[must_use = "call `dispatch` to add a dispatch to the logger and `apply` to set the global logger"]
#[derive(Debug)]
pub struct Builder<const READY: bool = true> {
    // for current dispatch
    filter: EnvFilter,
    appends: Vec<Box<dyn Append>>,

    // stashed dispatches
    dispatches: Vec<Dispatch>,

    // default to trace - we need this because the global default is OFF
    max_level: LevelFilter,
}

impl Default for Builder<false> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const READY: bool> Builder<READY> {
    /// Add an [`Append`] to the under constructing `Dispatch`.
    pub fn append(mut self, append: impl Into<Box<dyn Append>>) -> Builder<true> {
        self.appends.push(append.into());

        Builder {
            filter: self.filter,
            appends: self.appends,
            dispatches: self.dispatches,
            max_level: self.max_level,
        }
    }

    /// Set the global maximum log level.
    ///
    /// This will be passed to [`log::set_max_level`] on [`Builder::apply`].
    pub fn max_level(mut self, max_level: LevelFilter) -> Self {
        self.max_level = max_level;
        self
    }
}

impl Builder<false> {
    /// Create a new empty [`Builder`].
    pub fn new() -> Self {
        Self {
            filter: EnvFilter::from(LevelFilter::Trace),
            appends: vec![],
            dispatches: vec![],
            max_level: LevelFilter::Trace,
        }
    }

    /// Set the filter of the under constructing `Dispatch`.
    ///
    /// Accepts a [`LevelFilter`], a directive string such as `"info,billing=debug"`, or an
    /// [`EnvFilter`]. Default to [`LevelFilter::Trace`].
    pub fn filter(mut self, filter: impl Into<EnvFilter>) -> Builder<false> {
        self.filter = filter.into();
        self
    }
}

impl Builder<true> {
    /// Construct a new `Dispatch` with the configured filter and [`Append`]s.
    pub fn dispatch(mut self) -> Builder<false> {
        let dispatch = Dispatch::new(self.filter, self.appends);
        self.dispatches.push(dispatch);

        Builder {
            filter: EnvFilter::from(LevelFilter::Trace),
            appends: vec![],
            dispatches: self.dispatches,
            max_level: self.max_level,
        }
    }

    /// Build the [`Logger`] without installing it.
    pub fn build(mut self) -> Logger {
        let dispatch = Dispatch::new(self.filter, self.appends);
        self.dispatches.push(dispatch);
        Logger::new(self.dispatches)
    }

    /// Set up the global logger with all the dispatches configured.
    ///
    /// This should be called early in the execution of a Rust program. Any log events that
    /// occur before initialization will be ignored.
    ///
    /// # Errors
    ///
    /// This function will fail if it is called more than once, or if another library has
    /// already initialized a global logger.
    pub fn try_apply(self) -> Result<(), log::SetLoggerError> {
        let max_level = self.max_level;
        let logger = self.build();
        log::set_boxed_logger(Box::new(logger))?;
        log::set_max_level(max_level);
        Ok(())
    }

    /// Set up the global logger with all the dispatches configured.
    ///
    /// # Panics
    ///
    /// This function will panic if it is called more than once, or if another library has
    /// already initialized a global logger.
    pub fn apply(self) {
        self.try_apply()
            .expect("Builder::apply should not be called after the global logger initialized");
    }
}
