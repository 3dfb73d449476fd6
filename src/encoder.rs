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

//! Encoding of GELF 1.1 wire records.
//!
//! Output format:
//!
//! ```json
//! {"version":"1.1","host":"web-01","short_message":"disk full","full_message":"{\"level\":\"error\",\"message\":\"disk full\",\"mount\":\"/var\"}","timestamp":1700000000.123,"level":3,"_mount":"/var"}
//! ```

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::Error;
use crate::processor::Processed;

/// The GELF version written into every record.
pub const GELF_VERSION: &str = "1.1";

#[derive(Debug, Serialize)]
struct WireRecord<'a> {
    version: &'static str,
    host: &'a str,
    short_message: &'a str,
    full_message: &'a str,
    timestamp: f64,
    level: u8,
    #[serde(flatten)]
    additional: Map<String, Value>,
}

/// Builds wire records from an event and the output of a
/// [`FieldProcessor`](crate::processor::FieldProcessor).
#[derive(Debug, Clone, Copy, Default)]
pub struct GelfEncoder;

impl GelfEncoder {
    /// Encode one record.
    ///
    /// `original` is the event map as decoded, before any processing; it is rendered verbatim
    /// into `full_message`. The additional `_`-prefixed fields come from
    /// [`Processed::extra_fields`].
    pub fn encode(
        &self,
        short_message: &str,
        original: &Map<String, Value>,
        host: &str,
        processed: &Processed,
    ) -> Result<Vec<u8>, Error> {
        let full_message = serde_json::to_string(original).map_err(Error::serialization)?;
        let extra: Map<String, Value> =
            serde_json::from_slice(&processed.extra_fields).map_err(Error::serialization)?;

        let record = WireRecord {
            version: GELF_VERSION,
            host,
            short_message,
            full_message: &full_message,
            timestamp: processed.timestamp,
            level: processed.severity.as_u8(),
            additional: additional_fields(extra),
        };
        serde_json::to_vec(&record).map_err(Error::serialization)
    }
}

fn additional_fields(extra: Map<String, Value>) -> Map<String, Value> {
    extra
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Bool(b) => Value::String(b.to_string()),
                v => v,
            };
            (format!("_{key}"), value)
        })
        .collect()
}
