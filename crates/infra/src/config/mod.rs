//! Configuration loading
//!
//! Resolves the client [`Config`](kinderhub_domain::Config) from the
//! environment, a config file, or defaults, and turns the storage section
//! into a concrete session backend.

pub mod loader;

pub use loader::{
    build_storage, default_session_path, load, load_from_env, load_from_file, probe_config_paths,
};
