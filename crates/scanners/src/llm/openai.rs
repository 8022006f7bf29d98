//! OpenAI-backed provider implementation.

use crate::llm::provider::{LLMError, LLMProvider, LLMRequest, LLMResponse};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, ChatCompletionResponseFormat,
        ChatCompletionResponseFormatType, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

pub struct OpenAIProvider {
    client: Client<OpenAIConfig>,
    model: String,
    default_temperature: f32,
    default_max_tokens: u32,
    max_retries: u32,
}

impl OpenAIProvider {
    pub fn new(model: Option<String>) -> anyhow::Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY not set"))?;
        Ok(Self::with_config(
            api_key,
            model.unwrap_or_else(|| "gpt-4o".to_string()),
            0.2,
            4000,
        ))
    }

    pub fn with_config(api_key: String, model: String, temperature: f32, max_tokens: u32) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model,
            default_temperature: temperature,
            default_max_tokens: max_tokens,
            max_retries: 3,
        }
    }

    /// Responses sometimes arrive fenced in markdown even with the JSON
    /// response format requested; pull the object back out.
    fn extract_json_from_text(text: &str) -> String {
        if let Some(start) = text.find("```json") {
            if let Some(end) = text[start + 7..].find("```") {
                return text[start + 7..start + 7 + end].trim().to_string();
            }
        }
        if let Some(start) = text.find('{') {
            let mut depth = 0;
            let mut in_string = false;
            let mut escape_next = false;
            for (i, byte) in text.as_bytes()[start..].iter().enumerate() {
                if escape_next {
                    escape_next = false;
                    continue;
                }
                match byte {
                    b'\\' if in_string => escape_next = true,
                    b'"' => in_string = !in_string,
                    b'{' if !in_string => depth += 1,
                    b'}' if !in_string => {
                        depth -= 1;
                        if depth == 0 {
                            return text[start..start + i + 1].to_string();
                        }
                    }
                    _ => {}
                }
            }
        }
        text.to_string()
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn complete(&self, request: LLMRequest) -> Result<LLMResponse, LLMError> {
        let temperature = if request.temperature > 0.0 {
            request.temperature
        } else {
            self.default_temperature
        };
        let max_tokens = if request.max_tokens > 0 {
            request.max_tokens
        } else {
            self.default_max_tokens
        };

        debug!(model = %self.model, temperature, max_tokens, "sending analyzer request");

        let system_message = ChatCompletionRequestSystemMessage {
            content: request.system_prompt.clone(),
            ..Default::default()
        };
        let user_message = ChatCompletionRequestUserMessage {
            content: async_openai::types::ChatCompletionRequestUserMessageContent::Text(
                request.user_prompt.clone(),
            ),
            ..Default::default()
        };

        let api_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_message),
                ChatCompletionRequestMessage::User(user_message),
            ])
            .temperature(temperature)
            .max_tokens(max_tokens as u16)
            .response_format(ChatCompletionResponseFormat {
                r#type: ChatCompletionResponseFormatType::JsonObject,
            })
            .build()
            .map_err(|e| LLMError::ApiError(e.to_string()))?;

        let mut attempt = 0;
        let response = loop {
            attempt += 1;
            match self.client.chat().create(api_request.clone()).await {
                Ok(response) => break response,
                Err(e) => {
                    warn!(attempt, error = %e, "analyzer API call failed");
                    if attempt >= self.max_retries {
                        return Err(LLMError::ApiError(e.to_string()));
                    }
                    let wait = if e.to_string().contains("rate") {
                        Duration::from_secs(2_u64.pow(attempt))
                    } else {
                        Duration::from_millis(100 * attempt as u64)
                    };
                    tokio::time::sleep(wait).await;
                }
            }
        };

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| LLMError::InvalidResponse("no content in response".to_string()))?;

        Ok(LLMResponse {
            content: Self::extract_json_from_text(&content),
            model: response.model,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_fenced_json() {
        let fenced = "Here you go:\n```json\n{\"findings\":[]}\n```";
        assert_eq!(
            OpenAIProvider::extract_json_from_text(fenced),
            r#"{"findings":[]}"#
        );
    }

    #[test]
    fn extracts_bare_object_with_nested_braces() {
        let noisy = r#"prefix {"a":{"b":"}"},"c":1} suffix"#;
        assert_eq!(
            OpenAIProvider::extract_json_from_text(noisy),
            r#"{"a":{"b":"}"},"c":1}"#
        );
    }

    #[test]
    fn falls_back_to_full_text() {
        assert_eq!(OpenAIProvider::extract_json_from_text("no json"), "no json");
    }
}
