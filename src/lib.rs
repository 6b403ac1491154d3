pub mod consensus;
pub mod core;
pub mod edge;
pub mod forest;
pub mod profile;
pub mod server;
pub mod trainer;
pub mod weighting;
