use std::error::Error;
use std::io::{self, BufRead, Write};

use second_brain_agent::eval::datasets::{agent_dataset, retrieval_dataset};
use second_brain_agent::{
    AgentError, Judge, MemoryManager, RetrievalTarget, ThoughtAgent, build_provider,
};
use second_brain_core::Config;
use second_brain_knowledge::{KnowledgeEngine, KnowledgeError};

use crate::menu::{MENU, MenuAction, is_confirmed};

type ActionResult = Result<(), Box<dyn Error>>;

/// Interactive menu over one knowledge index. The thought agent is only
/// built on first use so that LLM credentials are optional for the
/// ingest, query and reset actions.
pub struct App {
    config: Config,
    knowledge: KnowledgeEngine,
    agent: Option<ThoughtAgent>,
}

impl App {
    pub fn new(config: Config, knowledge: KnowledgeEngine) -> Self {
        Self {
            config,
            knowledge,
            agent: None,
        }
    }

    /// Read choices from `input` until exit or end of input. Failed actions
    /// are reported and the loop continues.
    pub async fn run<R: BufRead, W: Write>(&mut self, input: &mut R, out: &mut W) -> io::Result<()> {
        writeln!(out, "🧠 Welcome to your Second Brain CLI")?;

        loop {
            writeln!(out, "\nChoose an option:")?;
            writeln!(out, "{MENU}")?;
            let Some(choice) = prompt(input, out, "Enter choice: ")? else {
                break;
            };

            let action = match choice.parse::<MenuAction>() {
                Ok(action) => action,
                Err(_) => {
                    writeln!(out, "❌ Invalid choice. Try again.")?;
                    continue;
                }
            };
            if action == MenuAction::Exit {
                writeln!(out, "👋 Exiting Second Brain. Goodbye!")?;
                break;
            }

            tracing::debug!(%action, "menu action");
            if let Err(e) = self.dispatch(action, input, out).await {
                tracing::error!(%action, "action failed: {}", e);
                writeln!(out, "⚠️ {e}")?;
            }
        }
        Ok(())
    }

    async fn dispatch<R: BufRead, W: Write>(
        &mut self,
        action: MenuAction,
        input: &mut R,
        out: &mut W,
    ) -> ActionResult {
        match action {
            MenuAction::Ingest => self.ingest(out).await,
            MenuAction::Query => self.query(input, out).await,
            MenuAction::Ask => self.ask(input, out).await,
            MenuAction::Reset => self.reset(input, out).await,
            MenuAction::ClearMemory => self.clear_memory(out).await,
            MenuAction::Evaluate => self.evaluate(out).await,
            MenuAction::Exit => Ok(()),
        }
    }

    async fn ingest<W: Write>(&self, out: &mut W) -> ActionResult {
        let report = self.knowledge.ingest_folder(None).await?;
        for file in report.ingested() {
            writeln!(out, "✅ Ingested {} ({} chunks)", file.filename, file.chunks)?;
        }
        writeln!(
            out,
            "📚 {} chunks indexed, {} unchanged files skipped.",
            report.total_chunks(),
            report.skipped_count()
        )?;
        Ok(())
    }

    async fn query<R: BufRead, W: Write>(&self, input: &mut R, out: &mut W) -> ActionResult {
        let Some(query) = prompt(input, out, "🔍 Enter your query: ")? else {
            return Ok(());
        };

        let hits = self.knowledge.query_notes(&query, None).await?;
        if hits.is_empty() {
            writeln!(out, "❌ No matching results found.")?;
            return Ok(());
        }

        let snippet_chars = self.knowledge.settings().snippet_chars;
        for hit in &hits {
            writeln!(out, "\n📘 {}:\n{}\n---", hit.filename, hit.snippet(snippet_chars))?;
        }
        Ok(())
    }

    async fn ask<R: BufRead, W: Write>(&mut self, input: &mut R, out: &mut W) -> ActionResult {
        let Some(question) = prompt(input, out, "💬 Ask your second brain: ")? else {
            return Ok(());
        };
        if question.is_empty() {
            writeln!(out, "❌ Please enter a question.")?;
            return Ok(());
        }

        let answer = self.agent().await?.run(&question).await?;
        writeln!(out, "\n🧠 {answer}")?;
        Ok(())
    }

    async fn reset<R: BufRead, W: Write>(&self, input: &mut R, out: &mut W) -> ActionResult {
        let answer = prompt(
            input,
            out,
            "⚠️ This will delete all stored data. Type 'yes' to confirm: ",
        )?;
        if !answer.as_deref().is_some_and(is_confirmed) {
            writeln!(out, "❌ Reset cancelled.")?;
            return Ok(());
        }

        let collection = &self.knowledge.settings().collection;
        match self.knowledge.reset_collection().await {
            Ok(()) => writeln!(out, "🧹 Collection '{collection}' deleted successfully.")?,
            Err(KnowledgeError::CollectionNotFound(_)) => {
                writeln!(out, "⚠️ Could not delete collection: '{collection}' does not exist.")?
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    async fn clear_memory<W: Write>(&self, out: &mut W) -> ActionResult {
        match &self.agent {
            Some(agent) => agent.clear_memory().await?,
            None => {
                let mut memory = MemoryManager::load(self.config.memory_path()?).await?;
                memory.clear().await?;
            }
        }
        writeln!(out, "🧠 Memory cleared successfully.")?;
        Ok(())
    }

    async fn evaluate<W: Write>(&mut self, out: &mut W) -> ActionResult {
        let judge = match self.config.judge_model()? {
            Some(spec) => Judge::Llm(build_provider(&spec, &self.config)?),
            None => Judge::OutputPresent,
        };
        let rule = "=".repeat(60);

        writeln!(out, "\n{rule}\n🔍 Retrieval Evaluation\n{rule}")?;
        let target = RetrievalTarget::new(self.knowledge.clone());
        let report = retrieval_dataset().evaluate(&target, &judge).await;
        write!(out, "{}", report.render(true, true, true))?;

        writeln!(out, "\n{rule}\n🤖 Agent Evaluation\n{rule}")?;
        let agent = self.agent().await?;
        let report = agent_dataset().evaluate(agent, &judge).await;
        write!(out, "{}", report.render(true, true, true))?;

        writeln!(out, "✅ All evaluations complete!")?;
        Ok(())
    }

    async fn agent(&mut self) -> Result<&ThoughtAgent, AgentError> {
        let agent = match self.agent.take() {
            Some(agent) => agent,
            None => {
                let agent = ThoughtAgent::from_config(&self.config, self.knowledge.clone()).await?;
                tracing::info!(model = agent.model(), "thought agent ready");
                agent
            }
        };
        Ok(self.agent.insert(agent))
    }
}

/// Print `label`, read one line. `None` at end of input.
fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> io::Result<Option<String>> {
    write!(out, "{label}")?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
