//! Locally fabricated replies for unrecognized model identifiers.
//!
//! Unknown models degrade to an echo response instead of failing, so a chat
//! UI pointed at a typo'd model name still gets something renderable. The
//! usage and timing constants are fixed and carry no meaning.

use crate::api::{ChatRequest, ChatResponse, Usage};

pub const SIMULATED_TIMING_MS: u64 = 500;

pub fn reply(request: &ChatRequest) -> ChatResponse {
    ChatResponse {
        content: format!("I'm responding to your message: \"{}\"", request.message),
        model: request.model.clone(),
        usage: Usage {
            prompt_tokens: 10,
            completion_tokens: 20,
            total_tokens: 30,
        },
        timing: SIMULATED_TIMING_MS,
    }
}
