//! Diagnostic creation, severity management, and rendering for moss.
//!
//! The PAR engine and the DRC never print directly: they emit structured
//! [`Diagnostic`]s into a [`DiagnosticSink`] so tests can capture them.
//! Error-severity diagnostics make the solve report failure; the CLI is the
//! only place that turns that into a process exit status. Warnings never
//! alter control flow.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{render, render_all};
pub use severity::Severity;
pub use sink::DiagnosticSink;
