use crate::providers::Provider;

use super::Case;

const JUDGE_SYSTEM_PROMPT: &str = "\
You grade the output of a personal knowledge assistant against a rubric.
Answer with PASS or FAIL on the first line, followed by a one-sentence reason.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub passed: bool,
    pub reason: String,
}

impl Verdict {
    fn pass(reason: impl Into<String>) -> Self {
        Self {
            passed: true,
            reason: reason.into(),
        }
    }

    fn fail(reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            reason: reason.into(),
        }
    }
}

pub enum Judge {
    /// Pass whenever the target produced non-empty output.
    OutputPresent,
    /// Ask a model to grade the output against the case rubric.
    Llm(Box<dyn Provider>),
}

impl Judge {
    pub async fn judge(&self, case: &Case, output: &str) -> Verdict {
        let rubric = case.rubric.as_ref();
        match (self, rubric) {
            (Judge::Llm(provider), Some(rubric)) => {
                let content = judge_input(&rubric.text, &case.input, output);
                match provider.send_message(Some(JUDGE_SYSTEM_PROMPT), &content).await {
                    Ok(response) => parse_verdict(&response.text),
                    Err(e) => {
                        tracing::warn!(case = %case.name, "judge request failed: {}", e);
                        Verdict::fail(format!("judge error: {e}"))
                    }
                }
            }
            _ => output_present(output),
        }
    }
}

fn output_present(output: &str) -> Verdict {
    if output.trim().is_empty() {
        Verdict::fail("empty output")
    } else {
        Verdict::pass("output produced")
    }
}

fn judge_input(rubric: &str, input: &str, output: &str) -> String {
    format!("Rubric:\n{rubric}\n\nInput:\n{input}\n\nOutput:\n{output}\n")
}

/// `PASS`/`FAIL` on the first non-empty line, the rest is the reason.
fn parse_verdict(text: &str) -> Verdict {
    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());
    let Some(first) = lines.next() else {
        return Verdict::fail("judge returned an empty verdict");
    };

    let head = first.trim_start_matches(|c: char| !c.is_ascii_alphabetic());
    let upper = head.to_ascii_uppercase();
    let passed = if upper.starts_with("PASS") {
        true
    } else if upper.starts_with("FAIL") {
        false
    } else {
        return Verdict::fail(format!("unparseable verdict: {first}"));
    };

    let inline = head[4..]
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .trim();
    let reason = if inline.is_empty() {
        lines.collect::<Vec<_>>().join(" ")
    } else {
        inline.to_string()
    };

    Verdict { passed, reason }
}
