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

//! Translation of framework level names into syslog severities.

use std::fmt;

/// A syslog severity, from 0 (most severe) to 7 (debug).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Severity {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    #[default]
    Informational = 6,
    Debug = 7,
}

impl Severity {
    /// The numeric value carried in the `level` field of a wire record.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

impl From<log::Level> for Severity {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Severity::Error,
            log::Level::Warn => Severity::Warning,
            log::Level::Info => Severity::Informational,
            log::Level::Debug => Severity::Debug,
            log::Level::Trace => Severity::Debug,
        }
    }
}

/// Maps the level names of one logging framework onto [`Severity`].
///
/// Implementations are pure: the same name always yields the same severity, and names the
/// table does not know translate to [`Severity::Informational`].
pub trait LevelTranslator: fmt::Debug + Send + Sync + 'static {
    /// The level name to assume when an event carries none.
    fn default_name(&self) -> &'static str {
        "info"
    }

    /// Translate a level name.
    fn translate(&self, name: &str) -> Severity;
}

fn lookup(table: &[(&str, Severity)], name: &str) -> Severity {
    table
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
        .map(|(_, severity)| *severity)
        .unwrap_or_default()
}

/// Level names of the [`log`] crate, as rendered by [`log::Level::as_str`].
#[derive(Debug, Default, Clone, Copy)]
pub struct LogLevels;

impl LogLevels {
    const TABLE: &'static [(&'static str, Severity)] = &[
        ("error", Severity::Error),
        ("warn", Severity::Warning),
        ("info", Severity::Informational),
        ("debug", Severity::Debug),
        ("trace", Severity::Debug),
    ];
}

impl LevelTranslator for LogLevels {
    fn translate(&self, name: &str) -> Severity {
        lookup(Self::TABLE, name)
    }
}

/// Level names emitted by zerolog.
///
/// zerolog has no notice or emergency level; `trace` is unmapped and falls back to
/// informational.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZerologLevels;

impl ZerologLevels {
    const TABLE: &'static [(&'static str, Severity)] = &[
        ("debug", Severity::Debug),
        ("info", Severity::Informational),
        ("warn", Severity::Warning),
        ("error", Severity::Error),
        ("fatal", Severity::Critical),
        ("panic", Severity::Alert),
    ];
}

impl LevelTranslator for ZerologLevels {
    fn translate(&self, name: &str) -> Severity {
        lookup(Self::TABLE, name)
    }
}

/// Level names emitted by zap.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZapLevels;

impl ZapLevels {
    const TABLE: &'static [(&'static str, Severity)] = &[
        ("debug", Severity::Debug),
        ("info", Severity::Informational),
        ("warn", Severity::Warning),
        ("error", Severity::Error),
        ("dpanic", Severity::Critical),
        ("panic", Severity::Alert),
        ("fatal", Severity::Emergency),
    ];
}

impl LevelTranslator for ZapLevels {
    fn translate(&self, name: &str) -> Severity {
        lookup(Self::TABLE, name)
    }
}
