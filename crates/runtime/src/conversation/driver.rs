//! The conversation loop.

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{Anomaly, Conversation, Step, classify};
use crate::Error;
use crate::model::{CompletionBackend, CompletionRequest, Message, SamplingConfig, ToolCall};
use crate::tools::{ArgumentPolicy, ToolService, Toolbox};

/// Default cap on completion requests per run.
pub const DEFAULT_MAX_TURNS: usize = 25;

/// Loop settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopConfig {
    pub max_turns: usize,
    pub argument_policy: ArgumentPolicy,
    pub sampling: SamplingConfig,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            argument_policy: ArgumentPolicy::default(),
            sampling: SamplingConfig::default(),
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The model stopped cleanly with this final content.
    Completed { content: String },
    /// The model produced neither a tool request nor a clean stop.
    Unresolved(Anomaly),
}

/// Result of a run that reached a terminal turn.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub conversation: Conversation,
    /// Completion requests made.
    pub turns: usize,
    /// Every tool result text, in the order it was appended.
    pub tool_outputs: Vec<String>,
    pub termination: Termination,
}

impl RunOutcome {
    /// Final assistant content, if the run completed.
    pub fn content(&self) -> Option<&str> {
        match &self.termination {
            Termination::Completed { content } => Some(content),
            Termination::Unresolved(_) => None,
        }
    }
}

/// A fatal run error, with the conversation as it stood at the failure.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct RunError {
    #[source]
    pub error: Error,
    pub conversation: Conversation,
    pub turns: usize,
}

/// State threaded through each turn.
struct LoopState {
    conversation: Conversation,
    turns: usize,
    tool_outputs: Vec<String>,
}

impl LoopState {
    fn finish(self, termination: Termination) -> RunOutcome {
        RunOutcome {
            conversation: self.conversation,
            turns: self.turns,
            tool_outputs: self.tool_outputs,
            termination,
        }
    }

    fn fail(self, error: Error) -> RunError {
        RunError {
            error,
            conversation: self.conversation,
            turns: self.turns,
        }
    }
}

enum Flow {
    Continue(LoopState),
    Done(RunOutcome),
}

/// Drives a conversation between a completion backend and a toolbox.
///
/// Turns run strictly one after another, and so do the tool calls within
/// a turn.
pub struct ConversationLoop<B, S> {
    backend: B,
    toolbox: Toolbox<S>,
    config: LoopConfig,
}

impl<B: CompletionBackend, S: ToolService> ConversationLoop<B, S> {
    pub fn new(backend: B, toolbox: Toolbox<S>) -> Self {
        Self {
            backend,
            toolbox,
            config: LoopConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LoopConfig) -> Self {
        self.config = config;
        self
    }

    pub fn toolbox(&self) -> &Toolbox<S> {
        &self.toolbox
    }

    pub fn into_toolbox(self) -> Toolbox<S> {
        self.toolbox
    }

    /// Run a fresh conversation seeded with `prompt`.
    pub async fn run(
        &self,
        prompt: impl Into<String>,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, RunError> {
        self.run_conversation(Conversation::new(prompt), cancel)
            .await
    }

    /// Run turns on `conversation` until the model finishes.
    pub async fn run_conversation(
        &self,
        conversation: Conversation,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, RunError> {
        let mut state = LoopState {
            conversation,
            turns: 0,
            tool_outputs: Vec::new(),
        };

        loop {
            state = match self.turn(state, cancel).await? {
                Flow::Continue(state) => state,
                Flow::Done(outcome) => return Ok(outcome),
            };
        }
    }

    async fn turn(
        &self,
        mut state: LoopState,
        cancel: &CancellationToken,
    ) -> Result<Flow, RunError> {
        if state.turns >= self.config.max_turns {
            let limit = self.config.max_turns;
            return Err(state.fail(Error::TurnLimitExceeded { limit }));
        }
        state.turns += 1;
        let turn = state.turns;

        let result = {
            let request = CompletionRequest {
                messages: state.conversation.messages(),
                tools: self.toolbox.functions(),
                sampling: self.config.sampling,
            };
            debug!(turn, messages = request.messages.len(), "requesting completion");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(Error::Cancelled),
                result = self.backend.complete(request) => result.map_err(Error::from),
            }
        };

        let result = match result {
            Ok(result) => result,
            Err(e) => return Err(state.fail(e)),
        };
        debug!(turn, finish_reason = %result.finish_reason, "completion received");

        match classify(result) {
            Step::Dispatch(message) => {
                let calls = message.tool_calls.clone();
                state.conversation.push(message);

                for call in &calls {
                    let text = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(state.fail(Error::Cancelled)),
                        text = self.execute(call) => text,
                    };
                    state.tool_outputs.push(text.clone());
                    state.conversation.push(Message::tool_result(&call.id, text));
                }

                Ok(Flow::Continue(state))
            }
            Step::Complete(message) => {
                info!(turn, "model finished");
                let content = message.content.clone();
                state.conversation.push(message);
                Ok(Flow::Done(state.finish(Termination::Completed { content })))
            }
            Step::Halt(anomaly) => {
                warn!(turn, %anomaly, "conversation unresolved");
                Ok(Flow::Done(state.finish(Termination::Unresolved(anomaly))))
            }
        }
    }

    /// Run one tool call; failures come back as an error payload.
    async fn execute(&self, call: &ToolCall) -> String {
        info!(tool = %call.name, call_id = %call.id, arguments = %call.arguments, "executing tool");

        match self
            .toolbox
            .dispatch(call, self.config.argument_policy)
            .await
        {
            Ok(text) => {
                debug!(tool = %call.name, call_id = %call.id, "tool succeeded");
                text
            }
            Err(e) => {
                warn!(tool = %call.name, call_id = %call.id, error = %e, "tool failed");
                e.to_payload()
            }
        }
    }
}
