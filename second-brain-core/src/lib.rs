pub mod config;
pub mod model_spec;
pub mod paths;

pub use config::{
    Config, ConfigError, EmbeddingProviderKind, KnowledgeSettings, Secrets, Settings,
    SettingsError, load_dotenv,
};
pub use model_spec::{ModelSpec, ModelSpecError, ProviderType};
