//! Types for the Claude API.
//!
//! These types match the Anthropic Messages API format for vision requests.

use serde::{Deserialize, Serialize};

const DEFAULT_MEDIA_TYPE: &str = "image/jpeg";

/// A message in a conversation with Claude.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender ("user" or "assistant").
    pub role: String,
    /// Content blocks of the message.
    pub content: Vec<ContentBlock>,
}

impl Message {
    /// A user turn.
    #[must_use]
    pub fn user(content: Vec<ContentBlock>) -> Self {
        Self {
            role: "user".to_string(),
            content,
        }
    }
}

/// A content block within a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
    /// Inline image.
    Image {
        /// Encoded image data.
        source: ImageSource,
    },
    /// Any block type this client does not use.
    #[serde(other)]
    Other,
}

/// Base64 image payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSource {
    /// Always "base64".
    #[serde(rename = "type")]
    pub kind: String,
    /// MIME type, e.g. "image/png".
    pub media_type: String,
    /// Base64 data without any `data:` prefix.
    pub data: String,
}

impl ImageSource {
    /// Build a source from raw base64 or a `data:<type>;base64,<data>` URL.
    ///
    /// Without a data-URL prefix the media type is assumed to be JPEG.
    #[must_use]
    pub fn from_base64(input: &str) -> Self {
        let input = input.trim();
        let (media_type, data) = input
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(";base64,"))
            .filter(|(media_type, _)| !media_type.is_empty())
            .unwrap_or((DEFAULT_MEDIA_TYPE, input));

        Self {
            kind: "base64".to_string(),
            media_type: media_type.to_string(),
            data: data.to_string(),
        }
    }
}

/// Request body for the Claude Messages API.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model to use (e.g., "claude-sonnet-4-20250514").
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Conversation messages.
    pub messages: Vec<Message>,
}

/// Response from the Claude Messages API.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Unique response ID.
    pub id: String,
    /// Model that generated the response.
    pub model: String,
    /// Reason the response stopped.
    pub stop_reason: Option<StopReason>,
    /// Response content blocks.
    pub content: Vec<ContentBlock>,
    /// Token usage information.
    pub usage: Usage,
}

impl ChatResponse {
    /// All text blocks, concatenated in order.
    #[must_use]
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of response.
    EndTurn,
    /// Max tokens reached.
    MaxTokens,
    /// Stop sequence encountered.
    StopSequence,
    /// Anything newer than this client.
    #[serde(other)]
    Other,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Usage {
    /// Input tokens consumed.
    pub input_tokens: u32,
    /// Output tokens generated.
    pub output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_image_source_from_data_url() {
        let source = ImageSource::from_base64("data:image/png;base64,iVBORw0KGgo=");
        assert_eq!(source.kind, "base64");
        assert_eq!(source.media_type, "image/png");
        assert_eq!(source.data, "iVBORw0KGgo=");
    }

    #[test]
    fn test_image_source_defaults_to_jpeg() {
        let source = ImageSource::from_base64("/9j/4AAQSkZJRg==");
        assert_eq!(source.media_type, "image/jpeg");
        assert_eq!(source.data, "/9j/4AAQSkZJRg==");

        // A data URL without a type keeps the default and the full input.
        let source = ImageSource::from_base64("data:;base64,abc");
        assert_eq!(source.media_type, "image/jpeg");
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "m".to_string(),
            max_tokens: 10,
            messages: vec![Message::user(vec![
                ContentBlock::Image {
                    source: ImageSource::from_base64("abc"),
                },
                ContentBlock::Text {
                    text: "hi".to_string(),
                },
            ])],
        };

        let value = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            value,
            json!({
                "model": "m",
                "max_tokens": 10,
                "messages": [{
                    "role": "user",
                    "content": [
                        {"type": "image", "source": {"type": "base64", "media_type": "image/jpeg", "data": "abc"}},
                        {"type": "text", "text": "hi"}
                    ]
                }]
            })
        );
    }

    #[test]
    fn test_response_text_skips_other_blocks() {
        let response: ChatResponse = serde_json::from_value(json!({
            "id": "msg_1",
            "model": "m",
            "stop_reason": "end_turn",
            "content": [
                {"type": "text", "text": "<html>"},
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "</html>"}
            ],
            "usage": {"input_tokens": 5, "output_tokens": 7}
        }))
        .expect("deserialize");

        assert_eq!(response.text(), "<html></html>");
        assert_eq!(response.stop_reason, Some(StopReason::EndTurn));
        assert_eq!(response.usage.output_tokens, 7);
    }
}
