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

//! The global logger can be installed once per process, so this binary holds a single test.

mod common;

use std::sync::Arc;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use common::MockCollector;
use log::LevelFilter;
use logforth_gelf::Append;
use logforth_gelf::Error;
use logforth_gelf::GelfWriter;
use logforth_gelf::Session;
use logforth_gelf::append::Gelf;
use serde_json::json;

#[derive(Debug, Clone, Default)]
struct Capture(Arc<Mutex<Vec<String>>>);

impl Append for Capture {
    fn append(&self, record: &log::Record) -> Result<(), Error> {
        self.0.lock().unwrap().push(record.args().to_string());
        Ok(())
    }
}

#[test]
fn log_records_reach_the_collector() {
    let mut collector = MockCollector::start();
    let addr = collector.addr();
    let session = Session::builder(collector.address())
        .host("app-01")
        .connect()
        .unwrap();
    let session = Arc::new(session);
    let internal = Capture::default();

    logforth_gelf::builder()
        .filter(LevelFilter::Debug)
        .append(Gelf::new(GelfWriter::new(session.clone())))
        .dispatch()
        .filter("logforth_gelf=debug")
        .append(internal.clone())
        .apply();

    log::info!(order = 42, paid = true; "charged card");
    log::trace!("filtered out");
    log::info!(target: "logforth_gelf::session", "never shipped");
    log::error!("card declined");
    log::logger().flush();

    let records = collector.records(2);
    assert_eq!(records.len(), 2, "{records:#?}");

    let charged = &records[0];
    assert_eq!(charged["host"], json!("app-01"));
    assert_eq!(charged["short_message"], json!("charged card"));
    assert_eq!(charged["level"], json!(6));
    assert_eq!(charged["_order"], json!(42));
    assert_eq!(charged["_paid"], json!("true"));
    assert_eq!(charged["_target"], json!("appender"));

    let declined = &records[1];
    assert_eq!(declined["short_message"], json!("card declined"));
    assert_eq!(declined["level"], json!(3));

    // reconnects are logged as lifecycle events, without the underlying error
    collector.stop();
    let _collector = MockCollector::restart(addr);
    let _ = session.send(b"{}");
    thread::sleep(Duration::from_millis(100));
    session.send(b"{}").unwrap();

    let messages = internal.0.lock().unwrap().clone();
    assert!(
        messages.iter().any(|m| m.contains("failed, reconnecting")),
        "{messages:#?}"
    );
    for message in &messages {
        assert!(!message.contains("os error"), "{message}");
        assert!(!message.to_lowercase().contains("broken pipe"), "{message}");
        assert!(!message.to_lowercase().contains("reset"), "{message}");
    }
}
