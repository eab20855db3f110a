//! Tests for SSE decoder

use super::*;

#[test]
fn test_simple_event() {
    let mut decoder = SseDecoder::new();
    let events = decoder.feed(b"data: {\"result\": \"hello\"}\n\n");

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].data, "{\"result\": \"hello\"}");
    assert_eq!(events[0].event_type, None);
}

#[test]
fn test_multiple_events_in_one_chunk() {
    let mut decoder = SseDecoder::new();
    let events = decoder.feed(b"data: first\n\ndata: second\n\n");

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].data, "first");
    assert_eq!(events[1].data, "second");
}

#[test]
fn test_partial_chunks() {
    let mut decoder = SseDecoder::new();

    assert!(decoder.feed(b"data: {\"res").is_empty());
    assert!(decoder.has_remaining());

    let events = decoder.feed(b"ult\": 1}\n\n");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].data, "{\"result\": 1}");
    assert!(!decoder.has_remaining());
}

#[test]
fn test_blank_lines_and_comments_skipped() {
    let mut decoder = SseDecoder::new();
    let events = decoder.feed(b"\n\n: keep-alive\n\ndata: x\n\n\n\n");

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].data, "x");
}

#[test]
fn test_crlf_delimiters() {
    let mut decoder = SseDecoder::new();
    let events = decoder.feed(b"event: message\r\ndata: a\r\n\r\ndata: b\r\n\r\n");

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_type.as_deref(), Some("message"));
    assert_eq!(events[0].data, "a");
    assert_eq!(events[1].data, "b");
}

#[test]
fn test_multi_line_data() {
    let mut decoder = SseDecoder::new();
    let events = decoder.feed(b"data: line1\ndata: line2\n\n");

    assert_eq!(events[0].data, "line1\nline2");
}

#[test]
fn test_data_without_space() {
    let mut decoder = SseDecoder::new();
    let events = decoder.feed(b"data:{\"is_end\":true}\n\n");

    assert_eq!(events[0].data, "{\"is_end\":true}");
}

#[test]
fn test_done_marker() {
    let mut decoder = SseDecoder::new();
    let events = decoder.feed(b"data: [DONE]\n\n");

    assert!(events[0].is_done());
}

#[test]
fn test_utf8_split_across_chunks() {
    let mut decoder = SseDecoder::new();
    let text = "data: 你好\n\n".as_bytes();

    // Split inside the first three-byte character
    assert!(decoder.feed(&text[..8]).is_empty());
    let events = decoder.feed(&text[8..]);

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].data, "你好");
}

#[test]
fn test_finish_flushes_unterminated_frame() {
    let mut decoder = SseDecoder::new();
    assert!(decoder.feed(b"data: tail").is_empty());

    let event = decoder.finish().unwrap();
    assert_eq!(event.data, "tail");
    assert!(decoder.finish().is_none());
}
