pub mod errors;
pub mod logging;

pub mod envs;
pub mod components;
pub mod agents;

pub mod render;
pub mod engine;
pub mod cli;
