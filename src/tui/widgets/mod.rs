//! TUI Widgets
//!
//! Custom widgets for the coding client.

mod progress;
mod results;
mod toast;

pub use progress::render_progress;
pub use results::{render_results, result_lines};
pub use toast::render_toasts;
