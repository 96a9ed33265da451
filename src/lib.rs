// Medical Coding Client - submit clinical documents and track ICD-10 coding workflows

pub mod api;
pub mod coding;
pub mod config;
pub mod models;
pub mod poller;
pub mod report;
pub mod tui;       // Terminal User Interface
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use api::{ApiError, HttpWorkflowApi, WorkflowApi};
pub use coding::CodingResult;
pub use config::Config;
pub use poller::{EventSink, Phase, PollerEvent, PollerSettings, WorkflowPoller};
pub use types::{AppError, AppResult, WorkflowError};
