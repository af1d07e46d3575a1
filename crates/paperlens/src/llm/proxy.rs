//! Completion proxy: builds and dispatches the outbound chat request.
//!
//! The proxy only selects routing (endpoint, headers, model name) and
//! assembles the message list; it hands the streaming response body back
//! untouched for the transcoder to consume.

use serde_json::json;

use crate::config::{Config, api};
use crate::error::{ApiError, ApiResult};
use crate::models::{ChatTurn, Provider};

/// Fixed system instruction for every completion request.
pub const SYSTEM_PROMPT: &str = "You are an academic research assistant. \
     You help summarize research papers clearly and concisely.";

/// One assembled completion request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Backend to route to.
    pub provider: Provider,

    /// Model id as picked from the catalog (ignored for the local provider,
    /// which is pinned to its configured model).
    pub model_id: String,

    /// User prompt.
    pub prompt: String,

    /// Selected passage from the paper to quote ahead of the prompt.
    pub selection: Option<String>,

    /// Full extracted document text.
    pub paper_text: String,

    /// Prior conversation turns, oldest first.
    pub history: Vec<ChatTurn>,
}

/// Proxy to the configured completion backends.
pub struct CompletionProxy {
    client: reqwest::Client,
    config: Config,
}

impl CompletionProxy {
    /// Create a proxy. No overall request timeout is set: completions can
    /// legitimately stream for minutes.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client =
            reqwest::Client::builder().connect_timeout(config.connect_timeout).build()?;
        Ok(Self { client, config })
    }

    /// Check that the selected provider is usable with current
    /// configuration.
    pub fn ensure_configured(&self, provider: Provider) -> ApiResult<()> {
        if provider == Provider::OpenRouter && !self.config.has_openrouter_key() {
            return Err(ApiError::Config(
                "OpenRouter API key not configured on the server.".to_string(),
            ));
        }
        Ok(())
    }

    fn endpoint(&self, provider: Provider) -> String {
        match provider {
            Provider::OpenRouter => {
                format!("{}/v1/chat/completions", self.config.openrouter_url)
            }
            Provider::Ollama => format!("{}/chat/completions", self.config.ollama_base_url),
        }
    }

    fn resolve_model(&self, provider: Provider, model_id: &str) -> String {
        match provider {
            Provider::Ollama => self
                .config
                .ollama_model
                .clone()
                .unwrap_or_else(|| api::OLLAMA_DEFAULT_MODEL.to_string()),
            Provider::OpenRouter => model_id.to_string(),
        }
    }

    /// Send the completion request and return the streaming response.
    ///
    /// A non-success upstream status surfaces as [`ApiError::Upstream`]
    /// carrying the backend's raw error text.
    pub async fn stream_completion(&self, request: &ChatRequest) -> ApiResult<reqwest::Response> {
        let endpoint = self.endpoint(request.provider);
        let model = self.resolve_model(request.provider, &request.model_id);
        let body = build_body(&model, request);

        tracing::info!(provider = %request.provider, %model, "dispatching completion request");

        let mut outbound = self.client.post(&endpoint).json(&body);
        if request.provider == Provider::OpenRouter {
            if let Some(key) = &self.config.openrouter_api_key {
                outbound = outbound
                    .bearer_auth(key)
                    .header("HTTP-Referer", &self.config.site_url)
                    .header("X-Title", "paperlens");
            }
        }

        let response = outbound.send().await.map_err(|err| {
            ApiError::upstream(request.provider.label(), err.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::upstream(request.provider.label(), text));
        }

        Ok(response)
    }
}

/// Assemble the chat message list: system instruction, prior turns, then
/// the prompt (optionally prefixed with quoted selection context) together
/// with the full document text.
fn build_body(model: &str, request: &ChatRequest) -> serde_json::Value {
    let mut prompt = request.prompt.clone();
    if let Some(selection) = request.selection.as_deref().filter(|s| !s.trim().is_empty()) {
        prompt = format!(
            "Regarding this selected text from the paper:\n\n\"{selection}\"\n\n{prompt}"
        );
    }

    let mut messages = vec![json!({"role": "system", "content": SYSTEM_PROMPT})];
    for turn in &request.history {
        messages.push(json!({"role": turn.role, "content": turn.content}));
    }
    messages.push(json!({
        "role": "user",
        "content": format!(
            "{prompt}\n\n--- Research Paper Content ---\n{}",
            request.paper_text
        ),
    }));

    json!({
        "model": model,
        "stream": true,
        "messages": messages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(provider: Provider) -> ChatRequest {
        ChatRequest {
            provider,
            model_id: "some/model".to_string(),
            prompt: "Summarize this.".to_string(),
            selection: None,
            paper_text: "Lorem ipsum.".to_string(),
            history: vec![],
        }
    }

    #[test]
    fn test_endpoint_per_provider() {
        let proxy = CompletionProxy::new(Config::for_testing("http://127.0.0.1:1")).unwrap();
        assert_eq!(
            proxy.endpoint(Provider::OpenRouter),
            "http://127.0.0.1:1/api/v1/chat/completions"
        );
        assert_eq!(proxy.endpoint(Provider::Ollama), "http://127.0.0.1:1/v1/chat/completions");
    }

    #[test]
    fn test_local_provider_pins_configured_model() {
        let mut config = Config::for_testing("http://127.0.0.1:1");
        config.ollama_model = Some("qwen3:8b".to_string());
        let proxy = CompletionProxy::new(config).unwrap();

        assert_eq!(proxy.resolve_model(Provider::Ollama, "ignored"), "qwen3:8b");
        assert_eq!(proxy.resolve_model(Provider::OpenRouter, "some/model"), "some/model");
    }

    #[test]
    fn test_local_model_default() {
        let proxy = CompletionProxy::new(Config::for_testing("http://127.0.0.1:1")).unwrap();
        assert_eq!(proxy.resolve_model(Provider::Ollama, "x"), "llama3");
    }

    #[test]
    fn test_remote_without_key_is_config_error() {
        let proxy = CompletionProxy::new(Config::for_testing("http://127.0.0.1:1")).unwrap();
        assert!(proxy.ensure_configured(Provider::Ollama).is_ok());
        assert!(matches!(
            proxy.ensure_configured(Provider::OpenRouter),
            Err(ApiError::Config(_))
        ));
    }

    #[test]
    fn test_body_message_order() {
        let mut req = request(Provider::Ollama);
        req.history = vec![
            ChatTurn { role: "user".to_string(), content: "earlier question".to_string() },
            ChatTurn { role: "assistant".to_string(), content: "earlier answer".to_string() },
        ];

        let body = build_body("llama3", &req);
        let messages = body["messages"].as_array().unwrap();

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["content"], "earlier question");
        assert_eq!(messages[2]["content"], "earlier answer");
        assert_eq!(messages[3]["role"], "user");
        let last = messages[3]["content"].as_str().unwrap();
        assert!(last.starts_with("Summarize this."));
        assert!(last.contains("--- Research Paper Content ---"));
        assert!(last.ends_with("Lorem ipsum."));
        assert_eq!(body["stream"], true);
    }

    #[test]
    fn test_selection_quoted_before_prompt() {
        let mut req = request(Provider::Ollama);
        req.selection = Some("the key lemma".to_string());

        let body = build_body("llama3", &req);
        let last = body["messages"].as_array().unwrap().last().unwrap();
        let content = last["content"].as_str().unwrap();
        assert!(content.starts_with(
            "Regarding this selected text from the paper:\n\n\"the key lemma\"\n\n"
        ));
    }

    #[test]
    fn test_blank_selection_ignored() {
        let mut req = request(Provider::Ollama);
        req.selection = Some("   ".to_string());

        let body = build_body("llama3", &req);
        let last = body["messages"].as_array().unwrap().last().unwrap();
        assert!(last["content"].as_str().unwrap().starts_with("Summarize this."));
    }
}
