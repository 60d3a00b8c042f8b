//! Check command report data structures.

use std::path::PathBuf;

use super::output::{Output, Report};

/// What a generation pass exported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSummary {
    pub module: String,
    pub classes: usize,
    pub functions: usize,
    /// Wrapper classes emitted for virtual dispatch and shims.
    pub wrappers: usize,
}

impl ModuleSummary {
    pub(crate) fn render(&self, out: &mut dyn Output) {
        out.section(&format!("  module {}", self.module));
        out.preformatted(&format!("    {}", plural(self.classes, "class", "classes")));
        out.preformatted(&format!(
            "    {}",
            plural(self.functions, "function", "functions")
        ));
        out.preformatted(&format!(
            "    {}",
            plural(self.wrappers, "wrapper", "wrappers")
        ));
    }
}

fn plural(count: usize, one: &str, many: &str) -> String {
    format!("{} {}", count, if count == 1 { one } else { many })
}

/// Report data from a check run.
#[derive(Debug)]
pub struct CheckReport {
    /// Path to the config file.
    pub config_path: PathBuf,
    pub summary: ModuleSummary,
    /// Error messages.
    pub errors: Vec<String>,
    /// Warning messages.
    pub warnings: Vec<String>,
    /// Info messages.
    pub infos: Vec<String>,
}

impl CheckReport {
    /// Whether the check passed (no errors).
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Report for CheckReport {
    fn render(&self, out: &mut dyn Output) {
        for error in &self.errors {
            out.error(error);
        }

        for warning in &self.warnings {
            out.warning(warning);
        }

        for info in &self.infos {
            out.preformatted(&format!("info: {}", info));
        }

        if !self.warnings.is_empty() || !self.errors.is_empty() || !self.infos.is_empty() {
            out.newline();
        }

        if self.is_valid() {
            out.preformatted(&format!("✓ {} is valid", self.config_path.display()));
            out.newline();
            self.summary.render(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::output::RecordingOutput;

    fn report(errors: Vec<String>, warnings: Vec<String>) -> CheckReport {
        CheckReport {
            config_path: PathBuf::from("cxxbind.toml"),
            summary: ModuleSummary {
                module: "geo".to_string(),
                classes: 3,
                functions: 1,
                wrappers: 2,
            },
            errors,
            warnings,
            infos: Vec::new(),
        }
    }

    #[test]
    fn test_render_valid() {
        let mut out = RecordingOutput::default();
        report(Vec::new(), vec!["missing call policy\n  --> ::geo::f".to_string()])
            .render(&mut out);

        assert_eq!(
            out.text(),
            "warning: missing call policy\n  --> ::geo::f\n\n✓ cxxbind.toml is valid\n\n  module geo:\n    3 classes\n    1 function\n    2 wrappers"
        );
    }

    #[test]
    fn test_render_errors_skip_summary() {
        let mut out = RecordingOutput::default();
        let report = report(vec!["boom".to_string()], Vec::new());
        report.render(&mut out);

        assert!(!report.is_valid());
        assert_eq!(out.lines, vec!["error: boom", ""]);
    }
}
