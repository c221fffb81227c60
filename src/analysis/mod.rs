//! Aggregate statistics over the results of all samples

pub mod abc;
pub mod geometry;
pub mod hm;
