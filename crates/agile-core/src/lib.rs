pub mod bdd;
pub mod config;
pub mod discovery;
pub mod error;
pub mod frontmatter;
pub mod gate;
pub mod guidance;
pub mod io;
pub mod issue;
pub mod lock;
pub mod markdown;
pub mod paths;
pub mod spec;
pub mod templates;
pub mod types;
pub mod workflow;

pub use error::{AgileError, Result};
