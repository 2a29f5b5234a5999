//! File-format collaborators: trajectory CSVs, scene images and run manifests.

pub mod csv_trajectory;
pub mod manifest;
pub mod scene;
