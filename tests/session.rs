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

mod common;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use common::MockCollector;
use logforth_gelf::ErrorKind;
use logforth_gelf::GelfWriter;
use logforth_gelf::Session;
use logforth_gelf::session::Framing;
use serde_json::json;

// Long enough for the RST answering a write into a closed peer to come back on loopback.
const SETTLE: Duration = Duration::from_millis(100);

#[test]
fn open_rejects_bad_addresses() {
    let err = Session::open("invalid:address", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert!(err.to_string().contains("invalid:address"), "{err}");

    // nothing listens on a freshly released port
    let mut collector = MockCollector::start();
    let address = collector.address();
    collector.stop();
    let err = Session::open(address, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
}

#[test]
fn reports_configuration() {
    let collector = MockCollector::start();
    let session = Session::builder(collector.address())
        .host("billing-01")
        .keepalive(None)
        .connect()
        .unwrap();

    assert_eq!(session.address(), collector.address());
    assert_eq!(session.host(), "billing-01");
    assert!(!session.is_tls());
    assert!(session.is_connected());

    let session = Session::open(collector.address(), None).unwrap();
    assert!(!session.host().is_empty());
}

#[test]
fn null_byte_framing_delimits_records() {
    let collector = MockCollector::start();
    let session = Session::builder(collector.address())
        .framing(Framing::NullByte)
        .connect()
        .unwrap();

    assert_eq!(session.send(br#"{"a":1}"#).unwrap(), 8);
    assert_eq!(session.send(br#"{"b":2}"#).unwrap(), 8);

    let records = collector.records(2);
    assert_eq!(records, vec![json!({"a": 1}), json!({"b": 2})]);
    assert_eq!(collector.raw(), b"{\"a\":1}\0{\"b\":2}\0");
}

#[test]
fn send_reconnects_once_after_reset() {
    let mut collector = MockCollector::start();
    let addr = collector.addr();
    let session = Session::open(collector.address(), None).unwrap();
    session.send(br#"{"n":1}"#).unwrap();
    assert_eq!(collector.records(1).len(), 1);

    collector.stop();
    let collector = MockCollector::restart(addr);

    // the first write into the closed peer is accepted locally and lost
    let _ = session.send(br#"{"n":2}"#);
    thread::sleep(SETTLE);

    // the next one fails, redials, and lands on the new collector
    session.send(br#"{"n":3}"#).unwrap();
    assert!(session.is_connected());
    let records = collector.records(1);
    assert_eq!(records, vec![json!({"n": 3})]);
}

#[test]
fn send_gives_up_after_one_reconnect() {
    let mut collector = MockCollector::start();
    let session = Session::open(collector.address(), None).unwrap();
    collector.stop();

    let _ = session.send(br#"{"n":1}"#);
    thread::sleep(SETTLE);

    let err = session.send(br#"{"n":2}"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert!(!session.is_connected());
}

#[test]
fn ensure_alive_redials_after_peer_closed() {
    let mut collector = MockCollector::start();
    let addr = collector.addr();
    let session = Session::open(collector.address(), None).unwrap();

    collector.stop();
    thread::sleep(SETTLE);
    let err = session.ensure_alive().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert!(!session.is_connected());

    let collector = MockCollector::restart(addr);
    session.ensure_alive().unwrap();
    assert!(session.is_connected());
    session.send(br#"{"back":true}"#).unwrap();
    assert_eq!(collector.records(1), vec![json!({"back": true})]);
}

#[test]
fn writer_recovers_when_collector_returns() {
    let mut collector = MockCollector::start();
    let addr = collector.addr();
    let writer = GelfWriter::new(Arc::new(Session::open(collector.address(), None).unwrap()));

    collector.stop();
    thread::sleep(SETTLE);
    let err = writer
        .write_event(br#"{"message":"server gone"}"#)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert!(!writer.session().is_connected());

    let collector = MockCollector::restart(addr);
    let event = br#"{"message":"server back"}"#;
    assert_eq!(writer.write_event(event).unwrap(), event.len());
    let records = collector.records(1);
    assert_eq!(records[0]["short_message"], json!("server back"));
}
