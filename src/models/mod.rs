pub mod candidate;
pub mod challenge;
pub mod filters;
pub mod match_result;
pub mod run_log;

pub use candidate::*;
pub use challenge::*;
pub use filters::*;
pub use match_result::*;
pub use run_log::*;
