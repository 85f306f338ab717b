//! Round orchestration.
//!
//! # Modules
//!
//! - [`engine`]   — `Orchestrator`, `StepOutcome`, `SessionOutcome`
//! - [`status`]   — `SessionStatus`
//! - [`settings`] — `OrchestratorSettings` (ceiling, timeouts, failure policy)
//! - [`cancel`]   — `CancelHandle`

pub mod cancel;
pub mod engine;
pub mod settings;
pub mod status;

pub use cancel::CancelHandle;
pub use engine::{Orchestrator, SessionOutcome, StepOutcome};
pub use settings::OrchestratorSettings;
pub use status::SessionStatus;
