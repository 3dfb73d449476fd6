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

//! Layouts for rendering log records into events.

use std::fmt;

use jiff::Timestamp;
use log::Record;
use serde_json::Map;
use serde_json::Number;
use serde_json::Value;

use crate::Error;
use crate::ErrorKind;
use crate::processor::LEVEL_FIELD;
use crate::processor::MESSAGE_FIELD;
use crate::processor::TIME_FIELD;

/// A layout for formatting log records.
pub trait Layout: fmt::Debug + Send + Sync + 'static {
    /// Format a log record.
    fn format(&self, record: &Record) -> Result<Vec<u8>, Error>;
}

impl<T: Layout> From<T> for Box<dyn Layout> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// A JSON layout producing the events a [`GelfWriter`](crate::GelfWriter) consumes.
///
/// Output format:
///
/// ```json
/// {"file":"src/main.rs","level":"INFO","line":12,"message":"charged card","module_path":"billing","order":42,"target":"billing","time":1723387497172}
/// ```
///
/// Key-values are flattened into the event with booleans and numbers kept as such. A
/// key-value named like a built-in field is shadowed by that field.
///
/// # Examples
///
/// ```
/// use logforth_gelf::layout::JsonEventLayout;
///
/// let layout = JsonEventLayout::default();
/// ```
#[derive(Debug, Default, Clone)]
pub struct JsonEventLayout {}

struct KvCollector<'a> {
    kvs: &'a mut Map<String, Value>,
}

impl<'kvs> log::kv::VisitSource<'kvs> for KvCollector<'_> {
    fn visit_pair(
        &mut self,
        key: log::kv::Key<'kvs>,
        value: log::kv::Value<'kvs>,
    ) -> Result<(), log::kv::Error> {
        self.kvs.insert(key.to_string(), kv_to_json(&value));
        Ok(())
    }
}

fn kv_to_json(value: &log::kv::Value) -> Value {
    if let Some(b) = value.to_bool() {
        Value::Bool(b)
    } else if let Some(n) = value.to_i64() {
        Value::from(n)
    } else if let Some(n) = value.to_u64() {
        Value::from(n)
    } else if let Some(n) = value.to_f64().and_then(Number::from_f64) {
        Value::Number(n)
    } else {
        Value::String(value.to_string())
    }
}

impl Layout for JsonEventLayout {
    fn format(&self, record: &Record) -> Result<Vec<u8>, Error> {
        let mut event = Map::new();
        let mut visitor = KvCollector { kvs: &mut event };
        record.key_values().visit(&mut visitor).map_err(|err| {
            Error::new(ErrorKind::Serialization, "failed to collect key-values").with_source(err)
        })?;

        event.insert(LEVEL_FIELD.into(), record.level().as_str().into());
        event.insert(TIME_FIELD.into(), Timestamp::now().as_millisecond().into());
        event.insert(MESSAGE_FIELD.into(), record.args().to_string().into());
        event.insert("target".into(), record.target().into());
        if let Some(module_path) = record.module_path() {
            event.insert("module_path".into(), module_path.into());
        }
        if let Some(file) = record.file() {
            event.insert("file".into(), file.into());
        }
        if let Some(line) = record.line() {
            event.insert("line".into(), line.into());
        }

        serde_json::to_vec(&event).map_err(Error::serialization)
    }
}
