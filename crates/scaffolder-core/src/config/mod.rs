//! Settings shared by every command

pub mod settings;

pub use settings::{load_env_file, load_user_env_file, Settings, ENV_FILE};
