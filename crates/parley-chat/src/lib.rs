//! Parley chat: one request/response cycle per user message.
//!
//! - **prompt**: system instruction + history placeholder, rendered into prompt messages
//! - **driver**: appends turns, calls the model, persists the session

pub mod driver;
pub mod prompt;

pub use driver::ConversationDriver;
pub use prompt::PromptTemplate;
