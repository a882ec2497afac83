pub mod artifacts;
pub mod logger;
pub mod trace;
