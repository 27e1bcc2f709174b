pub mod prompts;
pub mod protocol;
pub mod server;
pub mod stdio;
pub mod tools;

pub use server::{handle_message, handle_request, McpServer};
pub use stdio::run_stdio;
