//! Classification of one completion result.

use thiserror::Error;

use crate::model::{FinishReason, Message, Role, TurnResult};

/// A turn that ended the run without a clean answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Anomaly {
    /// The model asked for tools but named none.
    #[error("finish reason was tool_calls but the message carried no tool calls")]
    EmptyToolCalls,

    /// The model stopped for a reason other than a tool request or a clean stop.
    #[error("anomalous finish reason: {0}")]
    AnomalousFinish(String),
}

/// What the loop does with a turn result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Append this assistant message, then run its tool calls in order.
    Dispatch(Message),
    /// Append this message and finish.
    Complete(Message),
    /// Finish without appending.
    Halt(Anomaly),
}

/// Decide the next step from a turn result.
pub fn classify(result: TurnResult) -> Step {
    let TurnResult {
        finish_reason,
        message,
    } = result;

    match finish_reason {
        FinishReason::ToolCalls if message.tool_calls.is_empty() => {
            Step::Halt(Anomaly::EmptyToolCalls)
        }
        FinishReason::ToolCalls => Step::Dispatch(Message {
            role: Role::Assistant,
            tool_call_id: None,
            ..message
        }),
        FinishReason::Stop => Step::Complete(message),
        FinishReason::Other(reason) => Step::Halt(Anomaly::AnomalousFinish(reason)),
    }
}
