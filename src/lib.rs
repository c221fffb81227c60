//! Calibration of the hoopoe territory model
//!
//! Compares ABC rejection sampling with an uninformed prior against ABC rejection sampling with a prior narrowed by
//! history matching, over a sample of known ground-truth parameters.

pub mod algorithms;
pub mod analysis;
pub mod entrypoints;
pub mod logger;
pub mod routines {
    pub mod initialization;
    pub mod output;
    pub mod settings;
    pub mod store;
}
pub mod simulator;
pub mod structs {
    pub mod criteria;
    pub mod observation;
    pub mod parameters;
    pub mod region;
}

pub mod prelude {
    pub use crate::algorithms::{SampleState, SampleStatus, Stage};
    pub use crate::entrypoints;
    pub use crate::routines::initialization::{latin, sample_space, sobol};
    pub use crate::routines::settings::{self, Settings};
    pub use crate::routines::store::Store;
    pub use crate::simulator::{derive_seed, Engine, Model};
    pub use crate::structs::criteria::{Criteria, CriteriaScope};
    pub use crate::structs::observation::{ObservationRecord, Output, OutputTriple};
    pub use crate::structs::parameters::{Bounds, ParameterPoint, ORIG_BOUNDS};
    pub use crate::structs::region::{AbcPoint, AbcRun, AcceptedRegion, Variant, Wave, WavePoint};
}

//Tests
#[cfg(test)]
mod tests;
