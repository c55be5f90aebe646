//! CLI domain: parse, route, and presentation only.
//! Pipeline orchestration stays in the library; this layer collects input and renders results.

mod parse;
mod presentation;
mod route;

pub use parse::{Cli, Commands, ConfigCommands, RunArgs};
pub use presentation::{
    format_audit_table, format_provider_table, format_stage_failure, format_stage_line,
    format_session_summary,
};
pub use route::RunContext;
