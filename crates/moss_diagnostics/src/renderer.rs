//! Terminal rendering for diagnostics.
//!
//! The output contract is the classic PAR-tool format: one `ERROR:` /
//! `WARNING:` / `INFO:` line per diagnostic, followed by indented note
//! lines naming each involved entity.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Renders a single diagnostic into its terminal form.
///
/// Produces output like:
/// ```text
/// ERROR: [D004] multiple comparators tried to use different outputs from the ACMP0 input mux
///         comparator cmp_a requested P6
///         comparator cmp_b requested VDD
/// ```
pub fn render(diag: &Diagnostic) -> String {
    let tag = match diag.severity {
        Severity::Info => "INFO",
        Severity::Warning => "WARNING",
        Severity::Error => "ERROR",
    };
    let mut out = format!("{}: [{}] {}\n", tag, diag.code, diag.message);
    for note in &diag.notes {
        out.push_str(&format!("        {note}\n"));
    }
    out
}

/// Renders a slice of diagnostics, concatenated in emission order.
pub fn render_all(diags: &[Diagnostic]) -> String {
    diags.iter().map(render).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Category, DiagnosticCode};

    #[test]
    fn render_error_line() {
        let diag = Diagnostic::error(
            DiagnosticCode::new(Category::Drc, 1),
            "node \"ff1\" is not mapped to any site in the device",
        );
        let text = render(&diag);
        assert!(text.starts_with("ERROR: [D001] node \"ff1\""));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn render_warning_line() {
        let diag = Diagnostic::warning(
            DiagnosticCode::new(Category::Drc, 2),
            "node \"ff1\" has no load",
        );
        assert!(render(&diag).starts_with("WARNING: [D002]"));
    }

    #[test]
    fn render_info_line() {
        let diag = Diagnostic::info(DiagnosticCode::new(Category::Drc, 5), "enabling ACMP0");
        assert!(render(&diag).starts_with("INFO: [D005]"));
    }

    #[test]
    fn render_notes_indented() {
        let diag = Diagnostic::error(
            DiagnosticCode::new(Category::Drc, 4),
            "conflicting mux settings",
        )
        .with_note("comparator cmp_a requested P6");
        let text = render(&diag);
        assert!(text.contains("\n        comparator cmp_a requested P6\n"));
    }

    #[test]
    fn render_all_concatenates() {
        let diags = vec![
            Diagnostic::warning(DiagnosticCode::new(Category::Drc, 2), "first"),
            Diagnostic::error(DiagnosticCode::new(Category::Drc, 1), "second"),
        ];
        let text = render_all(&diags);
        let warning_pos = text.find("WARNING").unwrap();
        let error_pos = text.find("ERROR").unwrap();
        assert!(warning_pos < error_pos);
    }
}
