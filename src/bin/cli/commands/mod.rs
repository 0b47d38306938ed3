pub mod build;
pub mod diff;
