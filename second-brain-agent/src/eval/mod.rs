//! Offline evaluation of the assistant and of raw retrieval.
//!
//! A [`Dataset`] runs each [`Case`] input through an [`EvalTarget`], asks a
//! [`Judge`] for a verdict and collects an [`EvaluationReport`].

pub mod datasets;
mod judge;
mod report;

use async_trait::async_trait;
use serde::Serialize;

use second_brain_knowledge::KnowledgeEngine;

use crate::agent::ThoughtAgent;

pub use judge::{Judge, Verdict};
pub use report::{EvaluationReport, EvaluationResult};

/// Passages retrieved per case by [`RetrievalTarget`].
pub const RETRIEVAL_EVAL_RESULTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rubric {
    pub text: String,
    /// Judge model the rubric was written for, in `provider:model` form.
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Case {
    pub name: String,
    pub input: String,
    pub category: String,
    pub difficulty: String,
    pub rubric: Option<Rubric>,
}

impl Case {
    pub fn new(
        name: impl Into<String>,
        input: impl Into<String>,
        category: impl Into<String>,
        difficulty: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            input: input.into(),
            category: category.into(),
            difficulty: difficulty.into(),
            rubric: None,
        }
    }

    pub fn with_rubric(mut self, text: impl Into<String>, model: Option<&str>) -> Self {
        self.rubric = Some(Rubric {
            text: text.into(),
            model: model.map(str::to_string),
        });
        self
    }
}

/// Something that turns a case input into an output to be judged.
#[async_trait]
pub trait EvalTarget: Send + Sync {
    async fn run(&self, input: &str) -> Result<String, String>;
}

#[async_trait]
impl EvalTarget for ThoughtAgent {
    async fn run(&self, input: &str) -> Result<String, String> {
        ThoughtAgent::run(self, input).await.map_err(|e| e.to_string())
    }
}

/// Evaluates retrieval alone: the output is the formatted RAG context.
#[derive(Debug, Clone)]
pub struct RetrievalTarget {
    engine: KnowledgeEngine,
    n_results: usize,
}

impl RetrievalTarget {
    pub fn new(engine: KnowledgeEngine) -> Self {
        Self {
            engine,
            n_results: RETRIEVAL_EVAL_RESULTS,
        }
    }
}

#[async_trait]
impl EvalTarget for RetrievalTarget {
    async fn run(&self, input: &str) -> Result<String, String> {
        self.engine
            .rag_retrieve(input, Some(self.n_results))
            .await
            .map_err(|e| e.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub cases: Vec<Case>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, cases: Vec<Case>) -> Self {
        Self {
            name: name.into(),
            cases,
        }
    }

    /// Run every case in order. Target and judge failures fail the case;
    /// they never abort the run.
    pub async fn evaluate(&self, target: &dyn EvalTarget, judge: &Judge) -> EvaluationReport {
        let mut results = Vec::with_capacity(self.cases.len());

        for case in &self.cases {
            tracing::info!(dataset = %self.name, case = %case.name, "evaluating case");
            let result = match target.run(&case.input).await {
                Ok(output) => {
                    let verdict = judge.judge(case, &output).await;
                    EvaluationResult {
                        name: case.name.clone(),
                        input: case.input.clone(),
                        output,
                        passed: verdict.passed,
                        reason: verdict.reason,
                    }
                }
                Err(error) => {
                    tracing::warn!(case = %case.name, "target failed: {}", error);
                    EvaluationResult {
                        name: case.name.clone(),
                        input: case.input.clone(),
                        output: String::new(),
                        passed: false,
                        reason: format!("target error: {error}"),
                    }
                }
            };
            results.push(result);
        }

        let report = EvaluationReport::new(self.name.clone(), results);
        tracing::info!(
            dataset = %self.name,
            passed = report.passed_count(),
            total = report.results.len(),
            "evaluation finished"
        );
        report
    }
}
