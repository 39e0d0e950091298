//! Tests for the shared line protocol between worker and controller.

use forklink::protocol::{
    parse_line, parse_summary, write_announcement, write_summary, ProtocolError, ProtocolLine,
    RunSummary, SharedStream,
};

#[test]
fn summary_roundtrip() {
    let summary = RunSummary {
        run_count: 17,
        failure_count: 3,
        ignore_count: 4,
        run_time_ms: 1234,
    };

    let mut out = Vec::new();
    write_summary(&mut out, &summary).unwrap();
    let text = String::from_utf8(out).unwrap();
    let parsed = parse_summary(text.lines()).unwrap();

    assert_eq!(parsed, summary);
}

#[test]
fn summary_is_exactly_four_lines_in_fixed_order() {
    let mut out = Vec::new();
    write_summary(&mut out, &RunSummary::default()).unwrap();
    let text = String::from_utf8(out).unwrap();

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "[FORKLINK] Run Count : 0",
            "[FORKLINK] Failure Count : 0",
            "[FORKLINK] Ignore Count : 0",
            "[FORKLINK] Run Time (ms) : 0",
        ]
    );
}

#[test]
fn consumers_parse_by_key_not_position() {
    let shuffled = vec![
        "[FORKLINK] Failure Count : 2",
        "[FORKLINK] Run Time (ms) : 99",
        "[FORKLINK] Run Count : 7",
        "[FORKLINK] Ignore Count : 0",
    ];
    let summary = parse_summary(shuffled).unwrap();
    assert_eq!(summary.run_count, 7);
    assert_eq!(summary.failure_count, 2);
    assert_eq!(summary.run_time_ms, 99);
}

#[test]
fn interleaved_test_output_is_ignored() {
    let lines = vec![
        "starting database fixture",
        "[FORKLINK] Running com.acme.TestA",
        "test output line",
        "[FORKLINK] Run Count : 1",
        "[FORKLINK] Failure Count : 0",
        "[FORKLINK] Ignore Count : 0",
        "shutting down fixture",
        "[FORKLINK] Run Time (ms) : 12",
    ];
    let summary = parse_summary(lines).unwrap();
    assert_eq!(summary.run_count, 1);
    assert!(summary.was_successful());
}

#[test]
fn truncated_stream_is_missing_field_not_zeroes() {
    let lines = vec![
        "[FORKLINK] Run Count : 9",
        "[FORKLINK] Failure Count : 1",
    ];
    match parse_summary(lines).unwrap_err() {
        ProtocolError::MissingField(key) => assert_eq!(key, "Ignore Count"),
        other => panic!("expected MissingField, got {:?}", other),
    }
}

#[test]
fn malformed_tagged_line_is_an_error() {
    let lines = vec![
        "[FORKLINK] Run Count : twelve",
        "[FORKLINK] Failure Count : 0",
        "[FORKLINK] Ignore Count : 0",
        "[FORKLINK] Run Time (ms) : 1",
    ];
    assert!(matches!(parse_summary(lines), Err(ProtocolError::InvalidFormat(_))));
}

#[test]
fn announcement_roundtrip() {
    let mut out = Vec::new();
    write_announcement(&mut out, "com.acme.integration.LoginTest").unwrap();
    let text = String::from_utf8(out).unwrap();

    let parsed = parse_line(text.trim_end()).unwrap().unwrap();
    assert_eq!(
        parsed,
        ProtocolLine::Announcement { identifier: "com.acme.integration.LoginTest".to_string() }
    );
}

#[test]
fn shared_stream_serializes_writers() {
    let stream = SharedStream::new(Vec::new());
    let mut worker = stream.clone();
    let mut driver = stream.clone();

    write_announcement(&mut driver, "com.acme.TestA").unwrap();
    write_summary(&mut worker, &RunSummary::default()).unwrap();
    drop(worker);
    drop(driver);

    let text = String::from_utf8(stream.into_inner().unwrap()).unwrap();
    assert_eq!(text.lines().count(), 5);
    for line in text.lines() {
        assert!(line.starts_with("[FORKLINK] "), "line must be unbroken: {}", line);
    }
}
