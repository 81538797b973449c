//! Triangle-strip driver (C5): a family of stripification algorithms run
//! as competing "experiments" over a triangle list, scored by resulting
//! vertex count, with a validator that the winner still draws the same
//! triangles as the input.

mod algorithms;
mod experiment;
mod restart_splitter;

use thiserror::Error;

pub use algorithms::{stripify, to_fan_triangles, StripifyAlgo};
pub use experiment::{MeshOptimizerExperimentHolder, MeshOptimizerStats, Score};
pub use restart_splitter::PrimitiveRestartSplitter;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StripifyError {
    #[error("matrix primitive has no triangles to stripify")]
    EmptyInput,

    #[error("no experiment was registered for this holder")]
    NoExperiments,

    #[error("optimized mesh draws {after} triangle(s), the original drew {before}")]
    TriangleCountMismatch { before: usize, after: usize },

    #[error("optimized mesh triangle {index} does not match the original mesh's sorted triangle set")]
    TriangleSetMismatch { index: usize },
}
