//! Configuration module for Materiel
//!
//! This module provides configuration management including:
//! - Platform-aware path resolution
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::MaterielPaths;
pub use settings::Settings;
