//! Command layer: orchestrates webhook calls for the CLI and renders
//! results and progress in the terminal.

mod query;
mod upload;

pub use query::query;
pub use upload::upload;
