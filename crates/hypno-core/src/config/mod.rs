//! Configuration for session rendering
//!
//! - Generic YAML config loading/saving
//! - Default output and config paths under the user's home directory
//! - [`RenderConfig`], the settings the `render-session` binary runs with
//!
//! # Usage
//!
//! ```ignore
//! use hypno_core::config::{default_config_path, load_config, RenderConfig};
//!
//! let config: RenderConfig = load_config(&default_config_path("render.yaml"));
//! ```

mod io;
mod paths;
mod render;

pub use io::{load_config, save_config};
pub use paths::{default_config_path, default_output_dir};
pub use render::RenderConfig;
