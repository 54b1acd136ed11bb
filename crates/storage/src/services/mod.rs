pub mod access;
pub mod approvals;
pub mod leaderboard;
pub mod members;
pub mod navigator;
pub mod scoring;
pub mod status;
