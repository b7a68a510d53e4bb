//! Configuration system
//!
//! Loads ~/.config/chorewarrior/config.yaml with:
//! - Flatastic credentials and API root
//! - Assignment filtering (only_if_assigned / also_unassigned)
//! - Tagging and priority defaults for imported tasks

mod chorewarrior_config;
mod service_config;
pub mod validation;

pub use chorewarrior_config::ChoreWarriorConfig;
pub use service_config::{FlatasticConfig, DEFAULT_BASE_URL};
pub use validation::{validate_config, validate_config_result, ValidationError};
