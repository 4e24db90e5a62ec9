pub mod categorizer;
pub mod cli;
pub mod error;
pub mod fmt;
pub mod importer;
pub mod models;
pub mod ordered;
pub mod reconciler;
pub mod reports;
pub mod settings;
pub mod splitter;
