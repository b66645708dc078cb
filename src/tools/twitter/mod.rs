pub mod format;
pub mod prompts;
pub mod tool_router;

pub use tool_router::{TwitterRouter, TwitterSvc};
