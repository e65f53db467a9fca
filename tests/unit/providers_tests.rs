/*!
 * Tests for model provider and search client implementations
 */

use anyhow::Result;
use bytes::Bytes;
use futures::StreamExt;

use bucho::errors::ProviderError;
use bucho::providers::anthropic::{Anthropic, AnthropicRequest};
use bucho::providers::mock::MockProvider;
use bucho::providers::openai::OpenAI;
use bucho::providers::sse::{SseDecoder, SseEvent, decode_stream};
use bucho::providers::{CompletionRequest, Provider};
use bucho::search::tavily::Tavily;

#[test]
fn test_anthropic_request_withStreaming_shouldSerializeWireFields() -> Result<()> {
    let request = AnthropicRequest::new("claude-3-5-sonnet-latest", 4000)
        .add_message("user", "決裁書をレビューしてください")
        .streaming();

    let value = serde_json::to_value(&request)?;

    assert_eq!(value["model"], "claude-3-5-sonnet-latest");
    assert_eq!(value["max_tokens"], 4000);
    assert_eq!(value["stream"], true);
    assert_eq!(value["messages"][0]["role"], "user");
    assert!(value.get("system").is_none());
    Ok(())
}

#[test]
fn test_anthropic_request_withoutStreaming_shouldOmitStreamFlag() -> Result<()> {
    let request = AnthropicRequest::new("m", 10).add_message("user", "hi");
    let value = serde_json::to_value(&request)?;

    assert!(value.get("stream").is_none());
    assert_eq!(value["messages"][0]["content"], "hi");
    Ok(())
}

#[test]
fn test_openai_api_url_withTrailingSlash_shouldNormalize() {
    let client = OpenAI::new("", "http://localhost:1234/v1/", 30);
    assert_eq!(client.api_url(), "http://localhost:1234/v1/chat/completions");
}

#[test]
fn test_openai_parse_stream_event_withDone_shouldYieldNothing() {
    let event = SseEvent {
        event: None,
        data: "[DONE]".to_string(),
    };
    assert!(OpenAI::parse_stream_event(&event).is_none());
}

#[test]
fn test_clients_debug_shouldNotLeakKeys() -> Result<()> {
    let openai = OpenAI::new("sk-openai-secret", "", 30);
    let anthropic = Anthropic::with_timeout("sk-ant-secret", "", 30);
    let tavily = Tavily::new("tvly-secret", "", 30)?;

    assert!(!format!("{:?}", openai).contains("sk-openai-secret"));
    assert!(!format!("{:?}", anthropic).contains("sk-ant-secret"));
    assert!(!format!("{:?}", tavily).contains("tvly-secret"));
    Ok(())
}

#[test]
fn test_tavily_new_withBlankKey_shouldFail() {
    assert!(Tavily::new("   ", "", 30).is_err());
}

#[test]
fn test_sse_decoder_withSplitChunks_shouldReassembleEvents() {
    let mut decoder = SseDecoder::new();

    assert!(decoder.push(b"event: content_block_delta\nda").is_empty());
    let events = decoder.push(b"ta: {\"a\":1}\n\n: comment\ndata: second\n\n");

    assert_eq!(
        events,
        vec![
            SseEvent {
                event: Some("content_block_delta".to_string()),
                data: "{\"a\":1}".to_string(),
            },
            SseEvent {
                event: None,
                data: "second".to_string(),
            },
        ]
    );
}

#[test]
fn test_sse_decoder_withMultiByteCharacterSplit_shouldDecodeIntact() {
    let payload = "data: 承認\n\n".as_bytes();
    let mut decoder = SseDecoder::new();

    // Split inside the first kanji
    assert!(decoder.push(&payload[..7]).is_empty());
    let events = decoder.push(&payload[7..]);

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].data, "承認");
}

#[test]
fn test_sse_decoder_finish_withUnterminatedEvent_shouldFlushIt() {
    let mut decoder = SseDecoder::new();
    assert!(decoder.push(b"data: tail").is_empty());
    assert_eq!(decoder.finish().map(|e| e.data), Some("tail".to_string()));
    assert!(decoder.finish().is_none());
}

#[tokio::test]
async fn test_decode_stream_withAnthropicEvents_shouldYieldTextDeltas() {
    let chunks: Vec<Result<Bytes, String>> = vec![
        Ok(Bytes::from_static(
            b"event: message_start\ndata: {\"type\":\"message_start\"}\n\n",
        )),
        Ok(Bytes::from(
            "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"承認\"}}\n\n",
        )),
        Ok(Bytes::from(
            "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"できます\"}}\n\n",
        )),
        Err("connection reset".to_string()),
    ];

    let deltas: Vec<Result<String, ProviderError>> =
        decode_stream(futures::stream::iter(chunks), Anthropic::parse_stream_event)
            .collect()
            .await;

    assert_eq!(deltas.len(), 3);
    assert_eq!(deltas[0].as_ref().ok(), Some(&"承認".to_string()));
    assert_eq!(deltas[1].as_ref().ok(), Some(&"できます".to_string()));
    assert!(matches!(&deltas[2], Err(ProviderError::StreamError(m)) if m.contains("connection reset")));
}

#[tokio::test]
async fn test_decode_stream_withUnterminatedFinalEvent_shouldKeepItsText() {
    let chunks: Vec<Result<Bytes, String>> = vec![
        Ok(Bytes::from(
            "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"承認\"}}\n\n",
        )),
        Ok(Bytes::from(
            "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"できます\"}}",
        )),
    ];

    let deltas: Vec<String> = decode_stream(futures::stream::iter(chunks), Anthropic::parse_stream_event)
        .map(|d| d.expect("delta"))
        .collect()
        .await;

    assert_eq!(deltas, vec!["承認", "できます"]);
}

#[tokio::test]
async fn test_mock_provider_complete_withChunks_shouldJoinParts() -> Result<()> {
    let provider = MockProvider::chunks(["承認", "できます"]);
    let text = provider
        .complete(CompletionRequest::new("m", "prompt", 100))
        .await?;

    assert_eq!(text, "承認できます");
    assert_eq!(provider.request_count(), 1);
    assert_eq!(provider.requests()[0].max_tokens, 100);
    Ok(())
}
