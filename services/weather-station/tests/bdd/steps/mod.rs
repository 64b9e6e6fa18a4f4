//! BDD step definitions for the weather station

pub mod history_query_steps;
pub mod sampling_steps;
