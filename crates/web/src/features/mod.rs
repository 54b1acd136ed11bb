pub mod approvals;
pub mod members;
pub mod reports;
pub mod rounds;
pub mod sessions;
