//! Business logic services.

mod bootstrap;

pub use bootstrap::{BootstrapOutcome, BootstrapService};
