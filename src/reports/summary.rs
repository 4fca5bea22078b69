//! Summary report generator for shell output.

use super::{ReportConfig, ReportError, ReportFormat, ReportGenerator};
use crate::diff::DiffReport;

/// Apply ANSI color formatting if colored output is enabled.
fn ansi_color(text: &str, color: &str, colored: bool) -> String {
    if colored {
        match color {
            "red" => format!("\x1b[31m{text}\x1b[0m"),
            "green" => format!("\x1b[32m{text}\x1b[0m"),
            "yellow" => format!("\x1b[33m{text}\x1b[0m"),
            "cyan" => format!("\x1b[36m{text}\x1b[0m"),
            "bold" => format!("\x1b[1m{text}\x1b[0m"),
            "dim" => format!("\x1b[2m{text}\x1b[0m"),
            _ => text.to_string(),
        }
    } else {
        text.to_string()
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

/// Summary reporter for shell output
pub struct SummaryReporter {
    colored: bool,
    /// Maximum lines listed per section
    limit: usize,
}

impl SummaryReporter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            colored: true,
            limit: 20,
        }
    }

    /// Disable colored output
    #[must_use]
    pub const fn no_color(mut self) -> Self {
        self.colored = false;
        self
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        ansi_color(text, color, self.colored)
    }
}

impl Default for SummaryReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for SummaryReporter {
    fn generate_diff_report(
        &self,
        report: &DiffReport,
        config: &ReportConfig,
    ) -> Result<String, ReportError> {
        let mut lines = Vec::new();
        let summary = &report.summary;

        lines.push(self.color("BOM Diff Summary", "bold"));
        lines.push(self.color("─".repeat(40).as_str(), "dim"));
        lines.push(format!(
            "{}  {} → {}",
            self.color("Compare:", "cyan"),
            config.left_label,
            config.right_label
        ));
        lines.push(format!("{}     {}", self.color("Mode:", "cyan"), report.mode));
        lines.push(String::new());

        if !report.has_changes() {
            lines.push(self.color("No changes", "green"));
            if let Some(unchanged) = summary.unchanged {
                lines.push(format!("  {} unchanged", plural(unchanged, "line")));
            }
            lines.push(String::new());
            return Ok(lines.join("\n"));
        }

        lines.push(self.color("Changes:", "bold"));
        if summary.added > 0 {
            lines.push(format!(
                "  {} added",
                self.color(&format!("+{}", plural(summary.added, "line")), "green")
            ));
        }
        if summary.removed > 0 {
            lines.push(format!(
                "  {} removed",
                self.color(&format!("-{}", plural(summary.removed, "line")), "red")
            ));
        }
        if summary.changed > 0 {
            lines.push(format!(
                "  {} changed ({} major, {} minor, {} info)",
                self.color(&format!("~{}", plural(summary.changed, "line")), "yellow"),
                summary.changed_major,
                summary.changed_minor,
                summary.changed_info
            ));
        }
        if let Some(unchanged) = summary.unchanged {
            lines.push(format!("  {} unchanged", plural(unchanged, "line")));
        }

        for line in report.removed.iter().take(self.limit) {
            lines.push(format!("  {} {}", self.color("-", "red"), line.line_key));
        }
        for line in report.added.iter().take(self.limit) {
            lines.push(format!("  {} {}", self.color("+", "green"), line.line_key));
        }
        for changed in report.changed.iter().take(self.limit) {
            let fields: Vec<String> = changed
                .changes
                .iter()
                .map(|c| format!("{}: {} → {}", c.field, c.left.canonical(), c.right.canonical()))
                .collect();
            lines.push(format!(
                "  {} {} [{}] {}",
                self.color("~", "yellow"),
                changed.line_key,
                changed.severity,
                fields.join(", ")
            ));
        }
        let hidden = [summary.added, summary.removed, summary.changed]
            .iter()
            .map(|n| n.saturating_sub(self.limit))
            .sum::<usize>();
        if hidden > 0 {
            lines.push(self.color(&format!("  … {hidden} more"), "dim"));
        }
        lines.push(String::new());
        Ok(lines.join("\n"))
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{compare, CompareOptions};
    use crate::model::{BomTree, Edge, Node, TreeEdge};

    #[test]
    fn test_plain_summary() {
        let mut a = BomTree::new(Node::new("A"));
        let root = a.root();
        a.push_child(root, TreeEdge::plain(Edge::new("r1", "A", "X").with_quantity(1)), Node::new("X"));
        let mut b = a.clone();
        let root = b.root();
        b.push_child(root, TreeEdge::plain(Edge::new("r2", "A", "Y")), Node::new("Y"));

        let report = compare(&a, &b, "summarized", &CompareOptions::default()).unwrap();
        let text = SummaryReporter::new()
            .no_color()
            .generate_diff_report(&report, &ReportConfig::default())
            .unwrap();
        assert!(text.contains("+1 line added"));
        assert!(text.contains("+ ROOT::Y"));
        assert!(!text.contains("\x1b["));

        let same = compare(&a, &a, "summarized", &CompareOptions::default()).unwrap();
        let text = SummaryReporter::new()
            .no_color()
            .generate_diff_report(&same, &ReportConfig::default())
            .unwrap();
        assert!(text.contains("No changes"));
    }
}
