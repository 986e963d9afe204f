pub mod candidate;
pub mod candidate_search;
pub mod challenge;
pub mod match_record;
pub mod run_log;

pub use candidate::*;
pub use candidate_search::*;
pub use challenge::*;
pub use match_record::*;
pub use run_log::*;
