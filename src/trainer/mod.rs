pub mod fitter;
pub mod service;

pub use fitter::{EnsembleTrainer, RandomForestRegressor, RandomForestTrainer};
pub use service::ModelTrainer;
