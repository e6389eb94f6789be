pub mod number_scorer;
pub mod sets;

pub use number_scorer::{NumberScore, Objective};
pub use sets::{generate_sets, CandidateSet};
