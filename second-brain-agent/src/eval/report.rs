use std::fmt::Write as _;

use serde::Serialize;

const RULE_WIDTH: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationResult {
    pub name: String,
    pub input: String,
    pub output: String,
    pub passed: bool,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub dataset: String,
    pub results: Vec<EvaluationResult>,
}

impl EvaluationReport {
    pub fn new(dataset: impl Into<String>, results: Vec<EvaluationResult>) -> Self {
        Self {
            dataset: dataset.into(),
            results,
        }
    }

    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    /// Share of passed cases in percent; `0.0` for an empty report.
    pub fn pass_rate(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        self.passed_count() as f64 * 100.0 / self.results.len() as f64
    }

    pub fn render(&self, include_input: bool, include_output: bool, include_reasons: bool) -> String {
        let heavy = "=".repeat(RULE_WIDTH);
        let light = "-".repeat(RULE_WIDTH);
        let mut out = String::new();

        let _ = writeln!(out, "\n{heavy}");
        let _ = writeln!(out, "📊 Evaluation Report");
        let _ = writeln!(out, "{heavy}");

        for result in &self.results {
            let status = if result.passed { "✅ PASS" } else { "❌ FAIL" };
            let _ = writeln!(out, "\n{status} | {}", result.name);
            if include_input {
                let _ = writeln!(out, "  Input: {}", result.input);
            }
            if include_output {
                let _ = writeln!(out, "  Output: {}", result.output);
            }
            if include_reasons && !result.reason.is_empty() {
                let _ = writeln!(out, "  Reason: {}", result.reason);
            }
        }

        let _ = writeln!(out, "\n{light}");
        let _ = writeln!(
            out,
            "Summary: {}/{} passed ({:.1}%)",
            self.passed_count(),
            self.results.len(),
            self.pass_rate()
        );
        let _ = writeln!(out, "{heavy}");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, passed: bool) -> EvaluationResult {
        EvaluationResult {
            name: name.to_string(),
            input: format!("{name} input"),
            output: format!("{name} output"),
            passed,
            reason: if passed { "ok" } else { "missing topics" }.to_string(),
        }
    }

    #[test]
    fn pass_rate_counts() {
        let report = EvaluationReport::new(
            "agent",
            vec![result("a", true), result("b", false), result("c", true)],
        );
        assert_eq!(report.passed_count(), 2);
        assert!((report.pass_rate() - 66.666).abs() < 0.01);
        assert!(report.render(false, false, false).contains("Summary: 2/3 passed (66.7%)"));
    }

    #[test]
    fn empty_report_renders_zero() {
        let report = EvaluationReport::new("agent", Vec::new());
        assert!(report.render(true, true, true).contains("Summary: 0/0 passed (0.0%)"));
    }

    #[test]
    fn optional_sections() {
        let report = EvaluationReport::new("retrieval", vec![result("a", false)]);
        let minimal = report.render(false, false, false);
        assert!(minimal.contains("❌ FAIL | a"));
        assert!(!minimal.contains("Input:"));
        assert!(!minimal.contains("Reason:"));

        let full = report.render(true, true, true);
        assert!(full.contains("  Input: a input\n  Output: a output\n  Reason: missing topics\n"));
    }
}
