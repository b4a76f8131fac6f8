//! Utility functions and types

pub mod data_loader;

pub use data_loader::{resolve_csv_file, save_csv, DataLoader};
