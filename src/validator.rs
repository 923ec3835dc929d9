//! Certification path discovery and validation

pub mod chain_engine;
pub mod name_match;
pub mod path_results;
pub mod path_settings;
pub mod policy_processor;

pub use chain_engine::*;
pub use name_match::*;
pub use path_results::*;
pub use path_settings::*;
pub use policy_processor::*;
