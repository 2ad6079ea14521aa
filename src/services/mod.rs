//! Side-effecting collaborators: the analysis/chat provider client,
//! document persistence, and log setup. Everything here is injected into
//! the app so the overlay core stays free of I/O.

pub mod analysis;
pub mod store;
pub mod tracing_setup;
