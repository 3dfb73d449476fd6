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

//! Provides [`env_filter`](https://crates.io/crates/env_filter) based filter for log records.

use std::borrow::Cow;
use std::str::FromStr;

use log::LevelFilter;
use log::Metadata;
use log::Record;

/// The default environment variable for filtering logs.
pub const DEFAULT_FILTER_ENV: &str = "RUST_LOG";

/// A filter consists of one or more comma-separated directives which match on [`log::Record`].
///
/// The directive syntax is that of [`env_logger`](https://docs.rs/env_logger/#enabling-logging),
/// e.g. `info,billing=debug,hyper=off`.
///
/// # Examples
///
/// ```
/// use logforth_gelf::filter::EnvFilter;
///
/// let filter = EnvFilter::from_default_env_or("info");
/// ```
#[derive(Debug)]
pub struct EnvFilter(env_filter::Filter);

impl EnvFilter {
    /// Read directives from `RUST_LOG`, or use `default` when the variable is not set.
    pub fn from_default_env_or<'a>(default: impl Into<Cow<'a, str>>) -> Self {
        EnvFilter::from_env_or(DEFAULT_FILTER_ENV, default)
    }

    /// Read directives from the environment variable `name`, or use `default` when the
    /// variable is not set.
    pub fn from_env_or<'a, 'b>(
        name: impl Into<Cow<'a, str>>,
        default: impl Into<Cow<'b, str>>,
    ) -> Self {
        let name = name.into();
        let default: Cow<'b, str> = default.into();
        let mut builder = env_filter::Builder::new();
        match std::env::var(&*name) {
            Ok(directives) => builder.parse(&directives),
            Err(_) => builder.parse(&default),
        };
        EnvFilter(builder.build())
    }

    pub(crate) fn enabled(&self, metadata: &Metadata) -> bool {
        self.0.enabled(metadata)
    }

    pub(crate) fn matches(&self, record: &Record) -> bool {
        self.0.matches(record)
    }
}

impl From<LevelFilter> for EnvFilter {
    fn from(level: LevelFilter) -> Self {
        EnvFilter(env_filter::Builder::new().filter_level(level).build())
    }
}

impl<'a> From<&'a str> for EnvFilter {
    fn from(directives: &'a str) -> Self {
        EnvFilter(env_filter::Builder::new().parse(directives).build())
    }
}

impl FromStr for EnvFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut builder = env_filter::Builder::new();
        builder.try_parse(s)?;
        Ok(EnvFilter(builder.build()))
    }
}
