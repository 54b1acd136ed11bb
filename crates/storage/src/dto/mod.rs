pub mod common;
pub mod report;
pub mod scoring;
