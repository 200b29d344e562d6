//! Chat completions with tool execution
//!
//! [`ToolLoop`] sits between a client and a [`ModelBackend`]: model output is
//! scanned for tool-call blocks, the calls are dispatched, and their results
//! go back to the model until it stops asking for tools.

mod backend;
mod error;
mod openai;
mod tool_loop;
mod types;


pub use backend::ModelBackend;
pub use error::ModelError;
pub use openai::OpenAiBackend;
pub use tool_loop::{LoopOutcome, ToolLoop};
pub use types::{ChatMessage, ChatRequest};
