pub mod build;
pub mod config;
pub mod descriptor;
pub mod device;
pub mod error;
pub mod gate;
pub mod launch;
pub mod log;
pub mod notify;
pub mod resolver;
pub mod state;
pub mod version;
