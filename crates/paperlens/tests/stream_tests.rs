//! Async transcoding tests: chunk-boundary reassembly, termination, and
//! drop-based cancellation.

use std::convert::Infallible;

use bytes::Bytes;
use futures::StreamExt;
use futures::stream;
use paperlens::llm::transcode;
use tokio_stream::wrappers::ReceiverStream;

fn chunk(s: &str) -> Result<Bytes, Infallible> {
    Ok(Bytes::from(s.to_string()))
}

async fn collect_lines<S>(stream: S) -> Vec<serde_json::Value>
where
    S: futures::Stream<Item = Result<Bytes, Infallible>>,
{
    futures::pin_mut!(stream);
    let mut out = Vec::new();
    while let Some(Ok(bytes)) = stream.next().await {
        for line in String::from_utf8(bytes.to_vec()).unwrap().lines() {
            out.push(serde_json::from_str(line).unwrap());
        }
    }
    out
}

#[tokio::test]
async fn test_event_split_across_network_reads() {
    let upstream = stream::iter(vec![
        chunk(r#"data: {"choices":[{"delta":{"content":"#),
        chunk("\"hi\"}}]}\n"),
    ]);

    let events = collect_lines(transcode(upstream)).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["type"], "text");
    assert_eq!(events[0]["delta"], "hi");
}

#[tokio::test]
async fn test_full_session_round_trip() {
    let upstream = stream::iter(vec![
        chunk("data: {\"choices\":[{\"delta\":{\"reasoning_content\":\"let me think\"}}]}\n"),
        chunk("data: {\"choices\":[{\"delta\":{\"content\":\"The paper \"}}]}\ndata: "),
        chunk("{\"choices\":[{\"delta\":{\"content\":\"shows X.\"}}]}\n\ndata: [DONE]\n"),
    ]);

    let events = collect_lines(transcode(upstream)).await;
    assert_eq!(events.len(), 3);
    assert_eq!(events[0]["type"], "reasoning");

    let answer: String = events
        .iter()
        .filter(|e| e["type"] == "text")
        .map(|e| e["delta"].as_str().unwrap())
        .collect();
    assert_eq!(answer, "The paper shows X.");
}

#[tokio::test]
async fn test_unterminated_trailing_line_discarded() {
    let upstream = stream::iter(vec![
        chunk("data: {\"choices\":[{\"delta\":{\"content\":\"kept\"}}]}\n"),
        chunk("data: {\"choices\":[{\"delta\":{\"content\":\"lost\"}}]}"),
    ]);

    let events = collect_lines(transcode(upstream)).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["delta"], "kept");
}

#[tokio::test]
async fn test_upstream_error_closes_without_error_frame() {
    let upstream = stream::iter(vec![
        Ok(Bytes::from_static(b"data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n")),
        Err("connection reset".to_string()),
    ]);

    let events = collect_lines(transcode(upstream)).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["delta"], "ok");
}

#[tokio::test]
async fn test_cancellation_stops_output_and_releases_upstream() {
    let (tx, rx) = tokio::sync::mpsc::channel::<Result<Bytes, Infallible>>(16);

    for i in 0..4 {
        let line = format!("data: {{\"choices\":[{{\"delta\":{{\"content\":\"d{i}\"}}}}]}}\n");
        tx.send(Ok(Bytes::from(line))).await.unwrap();
    }

    let mut outbound = Box::pin(transcode(ReceiverStream::new(rx)));

    // Consume two events, then cancel by dropping the outbound stream.
    let first = outbound.next().await.unwrap().unwrap();
    let second = outbound.next().await.unwrap().unwrap();
    assert!(String::from_utf8_lossy(&first).contains("d0"));
    assert!(String::from_utf8_lossy(&second).contains("d1"));

    drop(outbound);

    // The upstream channel sees the receiver go away: the relay holds no
    // further interest in the connection, and nothing more is emitted.
    tx.closed().await;
    assert!(tx.is_closed());
}
