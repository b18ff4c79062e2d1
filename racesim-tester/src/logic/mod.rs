pub mod race_tester;
pub mod reports;
pub mod seeds;
pub mod tester;

pub use race_tester::{RacePlan, RaceSummary, RaceTester};
pub use seeds::resolve_seed_inputs;
pub use tester::*;
