use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use tracing::{Subscriber, info};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use second_brain_core::Config;
use second_brain_core::config::LoggingSettings;
use second_brain_knowledge::KnowledgeEngine;

mod app;
mod menu;

use app::App;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Settings decide the real subscriber, so loading them logs to stderr.
    let config = tracing::subscriber::with_default(
        bootstrap_subscriber(env_filter_or("info"), io::stderr),
        Config::load,
    )?;
    init_tracing(&config.settings.logging)?;

    let knowledge = KnowledgeEngine::open(config.knowledge_settings()?).await?;
    info!(
        "Knowledge index ready at {} (collection {})",
        knowledge.db_path().display(),
        knowledge.settings().collection
    );

    let mut app = App::new(config, knowledge);
    let stdin = io::stdin();
    app.run(&mut stdin.lock(), &mut io::stdout()).await?;
    Ok(())
}

/// `RUST_LOG` wins over `logging.level`. Logs go to stderr so they do not
/// mix with the menu, and to a file when enabled.
fn init_tracing(logging: &LoggingSettings) -> io::Result<()> {
    let env_filter = env_filter_or(&logging.level);

    let file_layer = match (&logging.file_enabled, &logging.file_path) {
        (true, Some(path)) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        _ => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

fn env_filter_or(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

fn bootstrap_subscriber<W>(filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .finish()
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use second_brain_core::Settings;
    use tempfile::TempDir;

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn default_config_notice_is_logged_before_tracing_init() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("second-brain").join("config.toml");
        let captured = Captured::default();
        let writer = captured.clone();

        let subscriber = bootstrap_subscriber(EnvFilter::new("info"), move || writer.clone());
        tracing::subscriber::with_default(subscriber, || Settings::load_from_path(&path)).unwrap();

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("Creating default configuration at"));
        assert!(logs.contains("config.toml"));
        assert!(path.exists());
    }
}
