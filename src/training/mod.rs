//! Model training
//!
//! - Regression trees and the random forest built from them
//! - The [`Regressor`] wrapper with shape-derived hyperparameters and persistence
//! - The batch training job that fits and saves the pipeline and model

mod config;
mod engine;
pub mod decision_tree;
pub mod random_forest;
pub mod regressor;

pub use config::{HyperparameterOverrides, ModelConfig};
pub use decision_tree::{DecisionTree, TreeNode};
pub use engine::{load_artifacts, run_training, target_values, train, TrainedArtifacts, TrainingSummary};
pub use random_forest::{MaxFeatures, RandomForest};
pub use regressor::{
    derive_params, DerivedParams, Hyperparameters, Regressor, MODEL_FILE_NAME, MODEL_FORMAT_VERSION,
};
