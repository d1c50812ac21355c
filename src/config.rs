mod env_file;
mod loader;
mod paths;
mod types;

pub use env_file::parse_key_value_file;
pub use loader::{load_env_file, overlay_lookup};
pub use paths::{default_config_path, DEFAULT_ENV_FILE};
pub use types::{Config, Settings, REPO_URL_ENV, TOKEN_ENV, URL_ENV};
