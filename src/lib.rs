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

//! Logforth GELF ships structured log events to a Graylog-compatible collector over TCP,
//! optionally wrapped in TLS.
//!
//! # Overview
//!
//! Events are flat JSON objects carrying at least a string `message`. Each event is
//! normalized by a [`FieldProcessor`](processor::FieldProcessor), encoded as a GELF 1.1
//! record and written to a [`Session`], which owns exactly one connection to the collector
//! and reconnects once when a write fails.
//!
//! Logging layers that already render JSON can write through a [`GelfWriter`], which also
//! implements [`std::io::Write`]. Applications using the [`log`] crate can install the
//! [`Gelf`](append::Gelf) appender through [`builder`].
//!
//! # Examples
//!
//! ```rust, no_run
//! use std::sync::Arc;
//!
//! use logforth_gelf::GelfWriter;
//! use logforth_gelf::Session;
//! use logforth_gelf::append::Gelf;
//! use logforth_gelf::filter::EnvFilter;
//!
//! let session = Arc::new(Session::open("graylog.example.com:12201", None).unwrap());
//!
//! logforth_gelf::builder()
//!     .filter(EnvFilter::from_default_env_or("info"))
//!     .append(Gelf::new(GelfWriter::new(session)))
//!     .apply();
//!
//! log::info!(order = 42, paid = true; "charged card");
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod append;
pub mod encoder;
pub mod filter;
pub mod layout;
pub mod level;
pub mod processor;
pub mod session;

mod error;
mod logger;
mod writer;

pub use self::append::Append;
pub use self::error::Error;
pub use self::error::ErrorKind;
pub use self::layout::Layout;
pub use self::logger::*;
pub use self::session::Session;
pub use self::writer::GelfWriter;
