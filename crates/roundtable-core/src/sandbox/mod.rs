//! Sandbox: bounded code execution for execution-capable participants.
//!
//! Code is saved into, and run from, a single working directory. Paths are
//! checked against that directory before anything is written, and every run
//! is bounded by a timeout so a hung script produces a `TimedOut` outcome
//! rather than stalling the session.
//!
//! # Modules
//!
//! - [`workdir`]    — `WorkDir` boundary (`resolve`, `write_file`)
//! - [`code_block`] — `CodeBlock`, fenced-block extraction, `ScriptLanguage`
//! - [`execution`]  — `ExecutionConfig`, `CodeExecutor`, `ExecutionOutcome`
//! - [`error`]      — `SandboxError` / `SandboxResult`

pub mod code_block;
pub mod error;
pub mod execution;
pub mod workdir;

pub use code_block::{extract_code_blocks, latest_code_blocks, CodeBlock, ScriptLanguage};
pub use error::{SandboxError, SandboxResult};
pub use execution::{
    truncate_output, CodeExecutor, ExecutionConfig, ExecutionOutcome, ExecutionStatus,
    TRUNCATION_MARKER,
};
pub use workdir::WorkDir;
