use crate::config::ChatConfig;
use crate::error::{DiaryError, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// A handle that can turn a (system, user) prompt pair into generated text.
///
/// `ChatClient` is the production implementation; tests inject stubs.
pub trait TextGenerator {
    fn complete(&self, system: &str, user: &str) -> Result<String>;
}

impl<T: TextGenerator + ?Sized> TextGenerator for &T {
    fn complete(&self, system: &str, user: &str) -> Result<String> {
        (**self).complete(system, user)
    }
}

/// Blocking client for an OpenAI-style chat-completions endpoint.
pub struct ChatClient {
    client: Client,
    config: ChatConfig,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Text-plus-images completion. Each image is an already-encoded data URI
    /// (or a plain URL) attached after the text part.
    pub fn complete_with_images(
        &self,
        system: &str,
        text: &str,
        image_urls: &[String],
    ) -> Result<String> {
        let mut parts = vec![Part::Text { text }];
        parts.extend(image_urls.iter().map(|url| Part::ImageUrl {
            image_url: ImageUrl { url: url.clone() },
        }));
        self.post(vec![
            Message {
                role: "system",
                content: Content::Text(system),
            },
            Message {
                role: "user",
                content: Content::Parts(parts),
            },
        ])
    }

    fn post(&self, messages: Vec<Message<'_>>) -> Result<String> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        debug!(%url, model = %self.config.model, "sending chat completion request");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(DiaryError::Chat(format!(
                "{url} returned {status}: {body}"
            )));
        }

        let body: ChatResponse = response.json()?;
        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| DiaryError::Chat("response contained no choices".into()))
    }
}

impl TextGenerator for ChatClient {
    fn complete(&self, system: &str, user: &str) -> Result<String> {
        self.post(vec![
            Message {
                role: "system",
                content: Content::Text(system),
            },
            Message {
                role: "user",
                content: Content::Text(user),
            },
        ])
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: Content<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Content<'a> {
    Text(&'a str),
    Parts(Vec<Part<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum Part<'a> {
    #[serde(rename = "text")]
    Text { text: &'a str },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_message_serializes_as_plain_string() {
        let msg = Message {
            role: "user",
            content: Content::Text("hello"),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["content"], "hello");
    }

    #[test]
    fn image_part_serializes_with_tagged_type() {
        let part = Part::ImageUrl {
            image_url: ImageUrl {
                url: "data:image/jpeg;base64,abc".to_string(),
            },
        };
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["type"], "image_url");
        assert_eq!(json["image_url"]["url"], "data:image/jpeg;base64,abc");
    }
}
