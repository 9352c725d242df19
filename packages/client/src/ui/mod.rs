//! Terminal front end.

pub mod formatter;
pub mod input;
pub mod renderer;
pub mod runner;

pub use formatter::ViewFormatter;
pub use renderer::TerminalRenderer;
pub use runner::run_client;
