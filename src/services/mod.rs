pub mod dedupe;
pub use dedupe::{DuplicateHit, DuplicateOracle, DuplicateSource};

pub mod filter;
pub use filter::{Candidate, FilterStage, StageOutcome, WantedFilter};

pub mod ledger;
pub use ledger::{RunStats, RunSummary, SessionLedger};

pub mod proper;
pub use proper::ProperHandler;

pub mod scheduler;
pub use scheduler::Scheduler;

pub mod sync;
pub use sync::{SkipReason, SyncError, SyncJob, Verdict};
