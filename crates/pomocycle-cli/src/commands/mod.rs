pub mod config;
mod render;
pub mod run;
pub mod status;
