// Command handlers module
pub mod completions;
pub mod config;
pub mod run;
pub mod score;
pub mod version;

// Re-exports for cleaner imports
pub use run::execute as run;
pub use score::execute as score;
pub use version::execute as version;
