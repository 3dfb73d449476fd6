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

//! Normalization of event fields before encoding.

use std::fmt;

use jiff::Timestamp;
use serde_json::Map;
use serde_json::Value;

use crate::Error;
use crate::level::LevelTranslator;
use crate::level::LogLevels;
use crate::level::Severity;

/// Field carrying the level name of an event.
pub const LEVEL_FIELD: &str = "level";
/// Field carrying the event time, in milliseconds since the Unix epoch.
pub const TIME_FIELD: &str = "time";
/// Field carrying the human-readable message of an event.
pub const MESSAGE_FIELD: &str = "message";

/// The outcome of [`FieldProcessor::process`].
#[derive(Debug, Clone, PartialEq)]
pub struct Processed {
    /// Severity translated from the `level` field.
    pub severity: Severity,
    /// Seconds since the Unix epoch, with a fractional part.
    pub timestamp: f64,
    /// JSON object holding every field that is not `level`, `time` or `message`.
    pub extra_fields: Vec<u8>,
}

/// Normalizes the fields of one event into severity, timestamp and residual fields.
///
/// A processor is chosen once per [`Session`](crate::Session) and shared by every writer of
/// that session.
pub trait FieldProcessor: fmt::Debug + Send + Sync + 'static {
    /// Process the fields in place.
    ///
    /// On success the reserved `level`, `time` and `message` fields have been removed from
    /// `fields`, and [`Processed::extra_fields`] is the serialized remainder.
    fn process(&self, fields: &mut Map<String, Value>) -> Result<Processed, Error>;
}

impl<T: FieldProcessor> From<T> for Box<dyn FieldProcessor> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// A [`FieldProcessor`] for events that carry `level` as a name and `time` as epoch
/// milliseconds, parametrized over the framework's level names.
///
/// # Examples
///
/// ```
/// use logforth_gelf::level::ZerologLevels;
/// use logforth_gelf::processor::FieldProcessor;
/// use logforth_gelf::processor::StandardFieldProcessor;
///
/// let processor = StandardFieldProcessor::new(ZerologLevels);
/// let mut fields = serde_json::json!({"level": "fatal", "time": 1700000000000u64, "message": "down"});
/// let processed = processor.process(fields.as_object_mut().unwrap()).unwrap();
/// assert_eq!(processed.severity.as_u8(), 2);
/// assert_eq!(processed.timestamp, 1700000000.0);
/// ```
#[derive(Debug, Clone)]
pub struct StandardFieldProcessor<L = LogLevels> {
    levels: L,
}

impl Default for StandardFieldProcessor<LogLevels> {
    fn default() -> Self {
        Self::new(LogLevels)
    }
}

impl<L: LevelTranslator> StandardFieldProcessor<L> {
    /// Create a processor translating level names with `levels`.
    pub fn new(levels: L) -> Self {
        Self { levels }
    }
}

impl<L: LevelTranslator> FieldProcessor for StandardFieldProcessor<L> {
    fn process(&self, fields: &mut Map<String, Value>) -> Result<Processed, Error> {
        if !fields.contains_key(TIME_FIELD) {
            let now = Timestamp::now().as_millisecond();
            fields.insert(TIME_FIELD.to_string(), Value::from(now));
        }
        let millis = fields
            .get(TIME_FIELD)
            .and_then(Value::as_f64)
            .ok_or_else(|| {
                Error::validation("field `time` is not a number")
                    .with_context("time", &fields[TIME_FIELD])
            })?;

        let severity = match fields.get(LEVEL_FIELD) {
            None => self.levels.translate(self.levels.default_name()),
            Some(Value::String(name)) => self.levels.translate(name),
            Some(other) => {
                return Err(Error::validation("field `level` is not a string")
                    .with_context("level", other));
            }
        };

        fields.remove(LEVEL_FIELD);
        fields.remove(TIME_FIELD);
        fields.remove(MESSAGE_FIELD);
        let extra_fields = serde_json::to_vec(fields).map_err(Error::serialization)?;

        Ok(Processed {
            severity,
            timestamp: millis / 1000.0,
            extra_fields,
        })
    }
}
