//! Output formatting for CLI.

mod json;
mod text;

pub use json::{ConfirmationOutput, JsonFormatter, SessionOutput};
pub use text::TextFormatter;
