/// Event system module - broken down into manageable components
mod core;
mod emitters;
mod handlers;
mod stats;
mod tests;

// Re-export all public items from submodules
pub use core::EventSystem;
pub use emitters::DispatchReport;
pub use stats::EventSystemStats;
