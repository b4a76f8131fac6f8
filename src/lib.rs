//! Diamond Pricer - diamond price regression service
//!
//! This crate provides the full lifecycle of a tabular price model:
//! - A fitted, serializable feature pipeline for diamond records
//! - A bagged random forest regressor with OOB scoring
//! - Held-out evaluation with RMSE, MAE, NMAE and R²
//! - An HTTP prediction service and a CLI
//!
//! # Modules
//!
//! ## Data
//! - [`schema`] - Dataset schema: id, target and typed predictor fields
//! - [`validation`] - Request record validation against the attribute domains
//! - [`utils`] - CSV loading and saving
//!
//! ## Model
//! - [`preprocessing`] - Column transformers and the fitted [`Pipeline`](preprocessing::Pipeline)
//! - [`training`] - Decision trees, random forest, regressor and training job
//! - [`evaluation`] - Scoring held-out data
//!
//! ## Services
//! - [`server`] - HTTP server with `/ping` and `/predict`
//! - [`cli`] - Command-line interface

pub mod error;

pub mod schema;
pub mod utils;
pub mod validation;

pub mod evaluation;
pub mod preprocessing;
pub mod training;

pub mod cli;
pub mod server;

pub use error::{PricerError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{PricerError, Result};

    pub use crate::schema::DataSchema;
    pub use crate::validation::DiamondRecord;

    pub use crate::preprocessing::{ColumnTransformer, FeatureMatrix, Pipeline, PipelineParams};

    pub use crate::training::{
        load_artifacts, run_training, train, ModelConfig, RandomForest, Regressor, TrainedArtifacts,
    };

    pub use crate::evaluation::{evaluate, run_evaluation, ScoreReport};

    pub use crate::server::{create_router, run_server, AppState, ServerConfig};
}
