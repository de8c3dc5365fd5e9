// ABOUTME: Command module aggregator for the labforge CLI.
// ABOUTME: Re-exports plan and rehearse command handlers.

mod plan;
mod rehearse;

pub use plan::plan;
pub use rehearse::rehearse;
