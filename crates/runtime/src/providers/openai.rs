//! OpenAI-compatible chat completions backend.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{
    CompletionBackend, CompletionError, CompletionRequest, FinishReason, FunctionSpec, Message,
    Role, ToolCall, TurnResult,
};

/// Default HTTP timeout for one completion round-trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    parallel_tool_calls: Option<bool>,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ApiToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ApiTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a FunctionSpec,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: ApiFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    #[serde(default)]
    finish_reason: Option<String>,
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ApiToolCall>>,
}

fn function_kind() -> String {
    "function".to_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating an OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAiBackendBuilder {
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl OpenAiBackendBuilder {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Send this key as a bearer token. Blank keys are ignored.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        self.api_key = (!api_key.trim().is_empty()).then_some(api_key);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<OpenAiBackend, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| CompletionError::Network(format!("failed to build client: {e}")))?;

        Ok(OpenAiBackend {
            client,
            endpoint: chat_endpoint(&self.base_url),
            model: self.model,
            api_key: self.api_key,
        })
    }
}

/// Backend for any service speaking the OpenAI chat completions API.
pub struct OpenAiBackend {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiBackend {
    pub fn builder(base_url: impl Into<String>, model: impl Into<String>) -> OpenAiBackendBuilder {
        OpenAiBackendBuilder::new(base_url, model)
    }

    fn role_to_api(role: Role) -> &'static str {
        match role {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }

    fn message_to_api(msg: &Message) -> ApiMessage<'_> {
        // Assistant turns that only call tools carry a null content.
        let content = if msg.role == Role::Assistant
            && msg.content.is_empty()
            && !msg.tool_calls.is_empty()
        {
            None
        } else {
            Some(msg.content.as_str())
        };

        ApiMessage {
            role: Self::role_to_api(msg.role),
            content,
            tool_calls: msg
                .tool_calls
                .iter()
                .map(|call| ApiToolCall {
                    id: call.id.clone(),
                    kind: function_kind(),
                    function: ApiFunctionCall {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    },
                })
                .collect(),
            tool_call_id: msg.tool_call_id.as_deref(),
        }
    }

    fn request_to_api<'a>(&'a self, request: &CompletionRequest<'a>) -> ApiRequest<'a> {
        let tools: Vec<ApiTool<'a>> = request
            .tools
            .iter()
            .map(|function| ApiTool {
                kind: "function",
                function,
            })
            .collect();

        // parallel_tool_calls is only accepted alongside tools.
        let parallel_tool_calls = (!tools.is_empty()).then_some(request.sampling.parallel_tool_calls);

        ApiRequest {
            model: &self.model,
            messages: request.messages.iter().map(Self::message_to_api).collect(),
            tools,
            temperature: request.sampling.temperature,
            parallel_tool_calls,
        }
    }

    fn response_to_turn(response: ApiResponse) -> Result<TurnResult, CompletionError> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::InvalidResponse("response has no choices".into()))?;

        let finish_reason = match choice.finish_reason.as_deref() {
            Some(reason) => FinishReason::parse(reason),
            None => FinishReason::Other("missing".into()),
        };

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCall {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();

        Ok(TurnResult {
            finish_reason,
            message: Message::assistant_tool_calls(
                choice.message.content.unwrap_or_default(),
                tool_calls,
            ),
        })
    }
}

impl std::fmt::Display for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "openai({}, {})", self.model, self.endpoint)
    }
}

impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<TurnResult, CompletionError> {
        let api_request = self.request_to_api(&request);
        debug!(
            endpoint = %self.endpoint,
            messages = api_request.messages.len(),
            tools = api_request.tools.len(),
            "sending chat completion"
        );

        let mut req = self
            .client
            .post(&self.endpoint)
            .header("accept", "application/json");
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req
            .json(&api_request)
            .send()
            .await
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

        Self::response_to_turn(api_response)
    }
}

fn chat_endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}
