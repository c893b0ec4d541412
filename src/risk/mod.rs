pub mod aggregation;
pub mod correlation;
pub mod var;
