// Domain layer - Core types, rules, configuration and errors

pub mod config;
pub mod errors;
pub mod model;
pub mod rules;
