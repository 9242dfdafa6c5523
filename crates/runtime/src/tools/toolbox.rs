//! Tool dispatch table and invocation.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{
    ArgumentPolicy, Arguments, CatalogError, ToolContent, ToolDescriptor, ToolError, ToolService,
    catalog, decode_arguments,
};
use crate::model::{FunctionSpec, ToolCall};
use crate::{Error, Result};

/// Default timeout for a single tool invocation.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Discovered tools, indexed by name, plus the service that runs them.
///
/// Built once at discovery time and never mutated afterwards.
pub struct Toolbox<S> {
    service: S,
    descriptors: Vec<ToolDescriptor>,
    functions: Vec<FunctionSpec>,
    index: HashMap<String, usize>,
    call_timeout: Duration,
}

impl<S: ToolService> Toolbox<S> {
    /// Ask the service for its catalog and build the dispatch table.
    pub async fn discover(service: S) -> Result<Self> {
        let descriptors = service
            .list_tools()
            .await
            .map_err(|e| Error::Connection(format!("failed to list tools: {e}")))?;
        info!(count = descriptors.len(), "discovered tools");
        Ok(Self::from_descriptors(service, descriptors)?)
    }

    /// Build the dispatch table from an already known catalog.
    ///
    /// When two descriptors share a name the first one wins.
    pub fn from_descriptors(
        service: S,
        descriptors: Vec<ToolDescriptor>,
    ) -> std::result::Result<Self, CatalogError> {
        let mut unique = Vec::with_capacity(descriptors.len());
        let mut index = HashMap::new();

        for (position, descriptor) in descriptors.into_iter().enumerate() {
            if descriptor.name.trim().is_empty() {
                return Err(CatalogError::MissingToolName { index: position });
            }
            if index.contains_key(&descriptor.name) {
                warn!(tool = %descriptor.name, "duplicate tool name, keeping first");
                continue;
            }
            index.insert(descriptor.name.clone(), unique.len());
            unique.push(descriptor);
        }

        let functions = catalog::to_function_specs(&unique)?;

        Ok(Self {
            service,
            descriptors: unique,
            functions,
            index,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        })
    }

    /// Set the timeout applied to each invocation.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Functions in the completion service's schema, in catalog order.
    pub fn functions(&self) -> &[FunctionSpec] {
        &self.functions
    }

    /// Descriptors in catalog order.
    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.descriptors[i])
    }

    /// The underlying service.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Give back the service, dropping the dispatch table.
    pub fn into_service(self) -> S {
        self.service
    }

    /// Decode, validate and invoke one model-issued tool call.
    ///
    /// Returns the text for the tool result message. Errors are local to the
    /// call; the caller turns them into an error payload.
    pub async fn dispatch(
        &self,
        call: &ToolCall,
        policy: ArgumentPolicy,
    ) -> std::result::Result<String, ToolError> {
        let descriptor = self
            .get(&call.name)
            .ok_or_else(|| ToolError::UnknownTool(call.name.clone()))?;

        let arguments = match decode_arguments(&call.arguments) {
            Ok(arguments) => {
                descriptor.input_schema.validate(&arguments)?;
                arguments
            }
            Err(e) if policy == ArgumentPolicy::Lenient => {
                warn!(
                    tool = %call.name,
                    call_id = %call.id,
                    error = %e,
                    "invoking with empty arguments"
                );
                Arguments::new()
            }
            Err(e) => return Err(e),
        };

        self.invoke(&call.name, arguments).await
    }

    /// Invoke a tool and return the text of its first content element.
    pub async fn invoke(
        &self,
        name: &str,
        arguments: Arguments,
    ) -> std::result::Result<String, ToolError> {
        debug!(tool = %name, ?arguments, "invoking tool");

        let contents = tokio::time::timeout(
            self.call_timeout,
            self.service.invoke_tool(name, arguments),
        )
        .await
        .map_err(|_| ToolError::Timeout(millis(self.call_timeout)))?
        .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        first_text(contents)
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn first_text(contents: Vec<ToolContent>) -> std::result::Result<String, ToolError> {
    let first = contents.into_iter().next().ok_or(ToolError::EmptyContent)?;
    match first.as_text() {
        Some(text) => Ok(text.to_string()),
        None => Err(ToolError::ContentTypeMismatch(first.kind)),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tools::{ParameterSchema, ToolServiceError};
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    /// Tool service with canned responses that records every invocation.
    #[derive(Default)]
    pub(crate) struct FakeToolService {
        pub tools: Vec<ToolDescriptor>,
        pub responses: HashMap<String, Vec<ToolContent>>,
        pub failures: HashMap<String, String>,
        pub list_failure: Option<String>,
        pub calls: Arc<Mutex<Vec<(String, Arguments)>>>,
    }

    impl FakeToolService {
        pub(crate) fn echo() -> Self {
            let mut service = Self::default();
            service.tools.push(ToolDescriptor {
                name: "echo".into(),
                description: Some("Echo".into()),
                input_schema: ParameterSchema::default(),
            });
            service
                .responses
                .insert("echo".into(), vec![ToolContent::text(r#"{"ok": true}"#)]);
            service
        }

        pub(crate) fn with_tool(
            mut self,
            name: &str,
            schema: Value,
            response: Vec<ToolContent>,
        ) -> Self {
            self.tools.push(ToolDescriptor {
                name: name.into(),
                description: None,
                input_schema: serde_json::from_value(schema).unwrap(),
            });
            self.responses.insert(name.into(), response);
            self
        }

        pub(crate) fn failing(mut self, name: &str, error: &str) -> Self {
            self.failures.insert(name.into(), error.into());
            self
        }

        pub(crate) fn unreachable(error: &str) -> Self {
            Self {
                list_failure: Some(error.into()),
                ..Self::echo()
            }
        }

        pub(crate) fn recorded(&self) -> Vec<(String, Arguments)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ToolService for FakeToolService {
        async fn list_tools(&self) -> std::result::Result<Vec<ToolDescriptor>, ToolServiceError> {
            if let Some(error) = &self.list_failure {
                return Err(ToolServiceError::Transport(error.clone()));
            }
            Ok(self.tools.clone())
        }

        async fn invoke_tool(
            &self,
            name: &str,
            arguments: Arguments,
        ) -> std::result::Result<Vec<ToolContent>, ToolServiceError> {
            self.calls
                .lock()
                .unwrap()
                .push((name.to_string(), arguments));
            if let Some(error) = self.failures.get(name) {
                return Err(ToolServiceError::Remote(error.clone()));
            }
            Ok(self.responses.get(name).cloned().unwrap_or_default())
        }
    }

    /// Never answers; used for timeouts and cancellation.
    pub(crate) struct StalledToolService;

    impl ToolService for StalledToolService {
        async fn list_tools(&self) -> std::result::Result<Vec<ToolDescriptor>, ToolServiceError> {
            Ok(vec![ToolDescriptor {
                name: "slow".into(),
                description: None,
                input_schema: ParameterSchema::default(),
            }])
        }

        async fn invoke_tool(
            &self,
            _name: &str,
            _arguments: Arguments,
        ) -> std::result::Result<Vec<ToolContent>, ToolServiceError> {
            std::future::pending().await
        }
    }

    fn call(name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: "call_1".into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    async fn toolbox(service: FakeToolService) -> Toolbox<FakeToolService> {
        Toolbox::discover(service).await.unwrap()
    }

    #[tokio::test]
    async fn discovery_builds_functions() {
        let toolbox = toolbox(FakeToolService::echo()).await;
        assert_eq!(toolbox.functions().len(), 1);
        assert_eq!(toolbox.functions()[0].name, "echo");
        assert!(toolbox.get("echo").is_some());
        assert!(toolbox.get("missing").is_none());
    }

    #[tokio::test]
    async fn failed_discovery_is_a_connection_error() {
        let service = FakeToolService::unreachable("connection refused");
        let calls = Arc::clone(&service.calls);

        let err = Toolbox::discover(service).await.err().unwrap();
        assert!(matches!(err, Error::Connection(msg) if msg.contains("connection refused")));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn duplicate_names_keep_first() {
        let mut service = FakeToolService::echo();
        let mut second = service.tools[0].clone();
        second.description = Some("second".into());
        service.tools.push(second);
        let tools = service.tools.clone();

        let toolbox = Toolbox::from_descriptors(service, tools).unwrap();
        assert_eq!(toolbox.descriptors().len(), 1);
        assert_eq!(toolbox.functions()[0].description, "Echo");
    }

    #[test]
    fn unnamed_descriptor_is_rejected() {
        let mut service = FakeToolService::echo();
        service.tools[0].name = String::new();
        let tools = service.tools.clone();
        let err = Toolbox::from_descriptors(service, tools).err().unwrap();
        assert_eq!(err, CatalogError::MissingToolName { index: 0 });
    }

    #[tokio::test]
    async fn dispatch_returns_first_text() {
        let toolbox = toolbox(FakeToolService::echo()).await;
        let text = toolbox
            .dispatch(&call("echo", r#"{"x":1}"#), ArgumentPolicy::Lenient)
            .await
            .unwrap();
        assert_eq!(text, r#"{"ok": true}"#);

        let recorded = toolbox.service().recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].1.get("x"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn lenient_policy_invokes_with_empty_arguments() {
        let toolbox = toolbox(FakeToolService::echo()).await;
        let result = toolbox
            .dispatch(&call("echo", "{not json"), ArgumentPolicy::Lenient)
            .await;
        assert!(result.is_ok());

        let recorded = toolbox.service().recorded();
        assert_eq!(recorded.len(), 1);
        assert!(recorded[0].1.is_empty());
    }

    #[tokio::test]
    async fn strict_policy_skips_invocation() {
        let toolbox = toolbox(FakeToolService::echo()).await;
        let err = toolbox
            .dispatch(&call("echo", "{not json"), ArgumentPolicy::Strict)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::ArgumentDecode(_)));
        assert!(toolbox.service().recorded().is_empty());
    }

    #[tokio::test]
    async fn schema_violation_skips_invocation() {
        let service = FakeToolService::default().with_tool(
            "search",
            json!({ "properties": { "q": { "type": "string" } }, "required": ["q"] }),
            vec![ToolContent::text("found")],
        );
        let toolbox = toolbox(service).await;
        let err = toolbox
            .dispatch(&call("search", r#"{"q": 7}"#), ArgumentPolicy::Lenient)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::SchemaViolation(_)));
        assert!(toolbox.service().recorded().is_empty());
    }

    #[tokio::test]
    async fn unknown_tool_is_reported() {
        let toolbox = toolbox(FakeToolService::echo()).await;
        let err = toolbox
            .dispatch(&call("nope", "{}"), ArgumentPolicy::Lenient)
            .await
            .unwrap_err();
        assert_eq!(err, ToolError::UnknownTool("nope".into()));
    }

    #[tokio::test]
    async fn remote_failure_becomes_execution_failed() {
        let toolbox = toolbox(FakeToolService::echo().failing("echo", "disk full")).await;
        let err = toolbox.invoke("echo", Arguments::new()).await.unwrap_err();
        assert_eq!(err, ToolError::ExecutionFailed("disk full".into()));
    }

    #[tokio::test]
    async fn non_text_content_is_a_mismatch() {
        let service = FakeToolService::default().with_tool(
            "shot",
            json!({}),
            vec![ToolContent::other("image"), ToolContent::text("ignored")],
        );
        let toolbox = toolbox(service).await;
        let err = toolbox.invoke("shot", Arguments::new()).await.unwrap_err();
        assert_eq!(err, ToolError::ContentTypeMismatch("image".into()));
    }

    #[tokio::test]
    async fn empty_content_is_reported() {
        let service = FakeToolService::default().with_tool("quiet", json!({}), Vec::new());
        let toolbox = toolbox(service).await;
        let err = toolbox.invoke("quiet", Arguments::new()).await.unwrap_err();
        assert_eq!(err, ToolError::EmptyContent);
    }

    #[tokio::test]
    async fn invocation_times_out() {
        let toolbox = Toolbox::discover(StalledToolService)
            .await
            .unwrap()
            .with_call_timeout(Duration::from_millis(20));
        let err = toolbox.invoke("slow", Arguments::new()).await.unwrap_err();
        assert_eq!(err, ToolError::Timeout(20));
    }

    #[test]
    fn huge_timeouts_saturate() {
        assert_eq!(millis(Duration::from_millis(1500)), 1500);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }
}
