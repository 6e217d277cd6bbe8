pub mod archive;
pub mod config;
pub mod generate;
pub mod release;
pub mod telemetry;
pub mod version;
