mod defaults;
mod errors;
mod loader;
mod models;

pub use defaults::DEFAULT_CONFIG_TEMPLATE;
pub use errors::ConfigError;
pub use models::{
    Config, DatabaseSettings, IconSettings, ServerSettings, SourceEndpoint, SourceSettings,
    StatusSettings, TrackedServer, UpstreamSchema,
};
