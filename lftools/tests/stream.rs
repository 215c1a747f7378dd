//! End-to-end decode tests over synthetic list files
//!
//! Streams are built with `ser`, written to temp files, and decoded through
//! a sink that records every invocation, so tests can assert on the exact
//! call sequence the reader produced.

use anyhow::bail;
use std::collections::HashMap;
use std::io::Write;

use lftools::error::DecodeError;
use lftools::reader::{decode, LfReader, PassSummary};
use lftools::sink::EventSink;
use lftools::{
    ser, EventPayload, FrameKey, PhaEvent, PsdEvent, RecordKind, KEY_BYTES, PHA_BYTES, PSD_BYTES,
};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Call {
    Init {
        board: u16,
        channels: u16,
        kind: RecordKind,
    },
    Event {
        board: u16,
        key: FrameKey,
        payload: EventPayload,
    },
    Finalize,
}

#[derive(Default)]
struct RecordingSink {
    calls: Vec<Call>,
    fail_events: bool,
}

impl EventSink for RecordingSink {
    fn init_board(&mut self, board: u16, channels: u16, kind: RecordKind) -> anyhow::Result<()> {
        self.calls.push(Call::Init { board, channels, kind });
        Ok(())
    }

    fn record_event(
        &mut self,
        board: u16,
        key: &FrameKey,
        payload: &EventPayload,
    ) -> anyhow::Result<()> {
        if self.fail_events {
            bail!("table is full");
        }
        self.calls.push(Call::Event {
            board,
            key: *key,
            payload: *payload,
        });
        Ok(())
    }

    fn finalize(&mut self) -> anyhow::Result<()> {
        self.calls.push(Call::Finalize);
        Ok(())
    }
}

fn key(board: u16, channel: u16, ts: u64, cfd: u16, bytes: usize) -> FrameKey {
    FrameKey {
        board,
        channel,
        timestamp: ts,
        cfd,
        pileup: false,
        saturated: false,
        lost: false,
        idle: bytes == KEY_BYTES,
        bytes: bytes as u32,
    }
}

fn pha(board: u16, channel: u16, ts: u64, energy: u16, cfd: u16) -> (FrameKey, Option<EventPayload>) {
    (
        key(board, channel, ts, cfd, PHA_BYTES),
        Some(EventPayload::Pha(PhaEvent { energy, cfd })),
    )
}

fn psd(board: u16, channel: u16, ts: u64, qs: u16, ql: u16, cfd: u16) -> (FrameKey, Option<EventPayload>) {
    (
        key(board, channel, ts, cfd, PSD_BYTES),
        Some(EventPayload::Psd(PsdEvent { qshort: qs, qlong: ql, cfd })),
    )
}

fn idle(board: u16, ts: u64) -> (FrameKey, Option<EventPayload>) {
    (key(board, 0, ts, 0, KEY_BYTES), None)
}

fn stream(records: &[(FrameKey, Option<EventPayload>)]) -> Vec<u8> {
    let mut buf = Vec::new();
    for (k, p) in records {
        match p {
            Some(payload) => ser::event(&mut buf, k, payload).unwrap(),
            None => ser::idle(&mut buf, k).unwrap(),
        }
    }
    buf
}

fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(bytes).unwrap();
    f.flush().unwrap();
    f
}

fn boards(ids: &[(u16, u16)]) -> HashMap<u16, u16> {
    ids.iter().copied().collect()
}

fn run_with_chunk(
    bytes: &[u8],
    cfg: HashMap<u16, u16>,
    chunk: usize,
) -> (Result<PassSummary, DecodeError>, Vec<Call>) {
    let f = write_temp(bytes);
    let mut sink = RecordingSink::default();
    let res = LfReader::new(cfg).chunk_bytes(chunk).read(f.path(), &mut sink);
    (res, sink.calls)
}

/// A mix of PHA, PSD, and idle records across two boards
fn mixed() -> Vec<(FrameKey, Option<EventPayload>)> {
    vec![
        pha(0, 1, 100, 500, 3),
        idle(0, 150),
        pha(0, 0, 200, 1023, 7),
        psd(2, 5, 250, 80, 1200, 12),
        idle(2, 300),
        psd(2, 5, 400, 90, 1500, 1),
        pha(0, 1, 500, 77, 0),
    ]
}

#[test]
fn mixed_stream_reproduces_every_field_in_order() {
    let records = mixed();
    let bytes = stream(&records);
    let (res, calls) = run_with_chunk(&bytes, boards(&[(0, 2), (2, 8)]), 1 << 16);
    let summary = res.unwrap();

    let mut expected = vec![Call::Init { board: 0, channels: 2, kind: RecordKind::Pha }];
    expected.push(Call::Event { board: 0, key: records[0].0, payload: records[0].1.unwrap() });
    expected.push(Call::Event { board: 0, key: records[2].0, payload: records[2].1.unwrap() });
    expected.push(Call::Init { board: 2, channels: 8, kind: RecordKind::Psd });
    expected.push(Call::Event { board: 2, key: records[3].0, payload: records[3].1.unwrap() });
    expected.push(Call::Event { board: 2, key: records[5].0, payload: records[5].1.unwrap() });
    expected.push(Call::Event { board: 0, key: records[6].0, payload: records[6].1.unwrap() });
    expected.push(Call::Finalize);
    assert_eq!(calls, expected);

    assert_eq!(summary.bytes, bytes.len() as u64);
    assert_eq!(summary.records, 7);
    assert_eq!(summary.events, 5);
    assert_eq!(summary.idle, 2);
    assert_eq!(summary.boards.get(&0), Some(&3));
    assert_eq!(summary.boards.get(&2), Some(&2));
}

#[test]
fn decoding_is_chunk_size_independent() {
    let bytes = stream(&mixed());
    let cfg = boards(&[(0, 2), (2, 8)]);
    let (reference, ref_calls) = run_with_chunk(&bytes, cfg.clone(), bytes.len() + 1);
    let reference = reference.unwrap();

    // Every chunk size down to a single header length must produce the
    // identical sequence of sink invocations.
    for chunk in KEY_BYTES..=bytes.len() + KEY_BYTES {
        let (res, calls) = run_with_chunk(&bytes, cfg.clone(), chunk);
        assert_eq!(res.unwrap(), reference, "chunk size {}", chunk);
        assert_eq!(calls, ref_calls, "chunk size {}", chunk);
    }
}

#[test]
fn record_straddling_a_chunk_boundary_decodes_exactly_once() {
    // First record is 32 bytes; chunk sizes 33..67 put the boundary at
    // every possible split point inside the 36-byte PSD record.
    let records = vec![pha(0, 0, 10, 40, 1), psd(0, 1, 20, 111, 2222, 5)];
    let bytes = stream(&records);
    let cfg = boards(&[(0, 2)]);
    let (_, reference) = run_with_chunk(&bytes, cfg.clone(), bytes.len());

    for split in 1..PSD_BYTES {
        let chunk = PHA_BYTES + split;
        let (res, calls) = run_with_chunk(&bytes, cfg.clone(), chunk);
        res.unwrap();
        assert_eq!(calls, reference, "boundary {} bytes into the record", split);
    }
}

#[test]
fn idle_records_advance_without_sink_calls() {
    let records = vec![idle(0, 1), idle(0, 2), idle(0, 3)];
    let bytes = stream(&records);
    let (res, calls) = run_with_chunk(&bytes, boards(&[(0, 4)]), 1 << 10);
    let summary = res.unwrap();
    assert_eq!(calls, vec![Call::Finalize]);
    assert_eq!(summary.records, 3);
    assert_eq!(summary.idle, 3);
    assert_eq!(summary.events, 0);
    assert_eq!(summary.bytes, (3 * KEY_BYTES) as u64);
}

#[test]
fn unknown_board_aborts_at_the_offending_offset() {
    let records = vec![
        pha(0, 0, 10, 1, 0),
        pha(0, 1, 20, 2, 0),
        pha(9, 0, 30, 3, 0), // board 9 is not configured
        pha(0, 0, 40, 4, 0),
    ];
    let bytes = stream(&records);
    let (res, calls) = run_with_chunk(&bytes, boards(&[(0, 2)]), 1 << 10);
    match res {
        Err(DecodeError::UnknownBoard { board, offset }) => {
            assert_eq!(board, 9);
            assert_eq!(offset, (2 * PHA_BYTES) as u64);
        }
        other => panic!("expected UnknownBoard, got {:?}", other),
    }
    // Nothing after the abort point reached the sink, and no finalize
    assert_eq!(calls.len(), 3);
    assert!(matches!(calls[0], Call::Init { board: 0, .. }));
    assert!(matches!(calls[1], Call::Event { board: 0, .. }));
    assert!(matches!(calls[2], Call::Event { board: 0, .. }));
}

#[test]
fn unknown_board_on_idle_record_also_aborts() {
    let bytes = stream(&[idle(5, 100)]);
    let (res, calls) = run_with_chunk(&bytes, boards(&[(0, 2)]), 1 << 10);
    match res {
        Err(DecodeError::UnknownBoard { board, offset }) => {
            assert_eq!(board, 5);
            assert_eq!(offset, 0);
        }
        other => panic!("expected UnknownBoard, got {:?}", other),
    }
    assert!(calls.is_empty());
}

#[test]
fn empty_file_decodes_to_nothing() {
    let (res, calls) = run_with_chunk(&[], boards(&[(0, 2)]), 1 << 10);
    let summary = res.unwrap();
    assert_eq!(summary, PassSummary::default());
    assert_eq!(calls, vec![Call::Finalize]);
}

#[test]
fn unrecognized_aggregate_size_is_fatal() {
    // A well-formed PHA record, then a header declaring 44 bytes: neither
    // PHA nor PSD, so there is no safe interpretation of the payload.
    let mut bytes = stream(&[pha(0, 0, 10, 1, 0)]);
    let bad = key(0, 0, 20, 0, 44);
    ser::frame_key(&mut bytes, &bad).unwrap();
    bytes.resize(PHA_BYTES + 44, 0);

    let (res, calls) = run_with_chunk(&bytes, boards(&[(0, 2)]), 1 << 10);
    match res {
        Err(DecodeError::UnknownFormat { board, size, offset }) => {
            assert_eq!(board, 0);
            assert_eq!(size, 44);
            assert_eq!(offset, PHA_BYTES as u64);
        }
        other => panic!("expected UnknownFormat, got {:?}", other),
    }
    // The earlier good record was still delivered
    assert_eq!(calls.len(), 2);
    assert!(matches!(calls[1], Call::Event { .. }));
}

#[test]
fn aggregate_size_smaller_than_a_header_is_fatal() {
    // Even an idle record cannot advance the cursor by less than a header
    let mut k = key(0, 0, 10, 0, KEY_BYTES);
    k.bytes = 8;
    let mut bytes = Vec::new();
    ser::frame_key(&mut bytes, &k).unwrap();

    let (res, _) = run_with_chunk(&bytes, boards(&[(0, 2)]), 1 << 10);
    match res {
        Err(DecodeError::UnknownFormat { size, offset, .. }) => {
            assert_eq!(size, 8);
            assert_eq!(offset, 0);
        }
        other => panic!("expected UnknownFormat, got {:?}", other),
    }
}

#[test]
fn record_past_end_of_file_is_fatal() {
    // A full PHA record followed by a lone PSD header: the declared 36
    // bytes run past end of file and no reload can complete them.
    let mut bytes = stream(&[pha(0, 0, 10, 1, 0)]);
    ser::frame_key(&mut bytes, &key(0, 1, 20, 0, PSD_BYTES)).unwrap();

    let (res, _) = run_with_chunk(&bytes, boards(&[(0, 2)]), 1 << 10);
    match res {
        Err(DecodeError::Truncated { offset, size, remaining }) => {
            assert_eq!(offset, PHA_BYTES as u64);
            assert_eq!(size, PSD_BYTES as u32);
            assert_eq!(remaining, KEY_BYTES as u64);
        }
        other => panic!("expected Truncated, got {:?}", other),
    }
}

#[test]
fn trailing_partial_header_is_fatal() {
    let mut bytes = stream(&[pha(0, 0, 10, 1, 0)]);
    bytes.extend_from_slice(&[0x55; 10]);

    let (res, _) = run_with_chunk(&bytes, boards(&[(0, 2)]), 1 << 10);
    match res {
        Err(DecodeError::Truncated { offset, remaining, .. }) => {
            assert_eq!(offset, PHA_BYTES as u64);
            assert_eq!(remaining, 10);
        }
        other => panic!("expected Truncated, got {:?}", other),
    }
}

#[test]
fn sink_rejection_aborts_with_offset() {
    let bytes = stream(&[pha(0, 0, 10, 1, 0), pha(0, 1, 20, 2, 0)]);
    let f = write_temp(&bytes);
    let mut sink = RecordingSink { fail_events: true, ..Default::default() };
    let res = decode(f.path(), boards(&[(0, 2)]), &mut sink);
    match res {
        Err(DecodeError::Sink { offset, .. }) => assert_eq!(offset, 0),
        other => panic!("expected Sink error, got {:?}", other),
    }
}

#[test]
fn missing_file_fails_before_decoding() {
    let mut sink = RecordingSink::default();
    let res = decode("/nonexistent/run42.lf", boards(&[(0, 2)]), &mut sink);
    assert!(matches!(res, Err(DecodeError::Open { .. })));
    assert!(sink.calls.is_empty());
}

#[test]
fn progress_reports_monotonic_cursor_positions() {
    let bytes = stream(&mixed());
    let f = write_temp(&bytes);
    let positions = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let p = positions.clone();
    let mut sink = RecordingSink::default();
    LfReader::new(boards(&[(0, 2), (2, 8)]))
        .chunk_bytes(KEY_BYTES)
        .on_chunk(move |pos, len| p.borrow_mut().push((pos, len)))
        .read(f.path(), &mut sink)
        .unwrap();

    let positions = positions.borrow();
    let len = bytes.len() as u64;
    assert!(positions.windows(2).all(|w| w[0].0 <= w[1].0));
    assert!(positions.iter().all(|&(_, l)| l == len));
    assert_eq!(positions.last(), Some(&(len, len)));
}
