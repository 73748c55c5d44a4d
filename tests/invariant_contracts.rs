//! Contract tests for stream invariants.
//!
//! Each test drives the operation that enforces an invariant and then checks that
//! the invariant fired. The invariant log is shared by every test in this binary,
//! so it is never cleared here.

use chatstream::context::AppContext;
use chatstream::invariant_ppt::{
    contract_test, CYCLE_REJECTED, DESTINATIONS_UNIQUE, GATE_SUPPRESSES_OUTPUT,
    INIT_FIRST_CALL_WINS, LINE_START_AFTER_ENDL, SELF_CONNECTION_IGNORED,
};
use chatstream::sink::Sink;
use chatstream::stream::OStream;
use chatstream::ChatError;

#[test]
fn self_connection_contract() {
    let stream = OStream::new(0);
    stream.connect_stream(&stream).unwrap();
    assert_eq!(stream.stream_count(), 0);
    contract_test("self connection", &[SELF_CONNECTION_IGNORED]);
}

#[test]
fn cycle_contract() {
    let a = OStream::new(0);
    let b = OStream::new(0);
    let c = OStream::new(0);
    a.connect_stream(&b).unwrap();
    b.connect_stream(&c).unwrap();

    let err = c.connect_stream(&a).unwrap_err();
    assert!(matches!(err, ChatError::CycleDetected { from, to } if from == c.id() && to == a.id()));
    assert_eq!(c.stream_count(), 0);
    contract_test("cycle rejection", &[CYCLE_REJECTED]);
}

#[test]
fn unique_destinations_contract() {
    let (sink, buffer) = Sink::memory("dup");
    let stream = OStream::new(0);
    let dest = OStream::new(0);
    stream.connect_sink(&sink);
    stream.connect_sink(&sink);
    stream.connect_stream(&dest).unwrap();
    stream.connect_stream(&dest).unwrap();
    assert_eq!(stream.sink_count(), 1);
    assert_eq!(stream.stream_count(), 1);

    stream.write("once").endl();
    assert_eq!(buffer.contents(), "once\n");
    contract_test("unique destinations", &[DESTINATIONS_UNIQUE]);
}

#[test]
fn gate_and_line_contracts() {
    let (sink, buffer) = Sink::memory("gate");
    let stream = OStream::new(2);
    stream.connect_sink(&sink);
    stream.set_chatter(3).write("dropped").write_str("dropped too");
    stream.set_chatter(2).write("kept").endl();
    assert_eq!(buffer.contents(), "kept\n");
    assert!(stream.at_line_start());
    contract_test("gate and line", &[GATE_SUPPRESSES_OUTPUT, LINE_START_AFTER_ENDL]);
}

#[test]
fn initialization_contract() {
    let context = AppContext::new();
    assert!(context.configure("first", 1, false));
    assert!(!context.configure("second", 9, true));
    assert_eq!(context.exec_name(), "first");
    contract_test("first initialization wins", &[INIT_FIRST_CALL_WINS]);
}
