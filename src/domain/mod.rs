pub mod branch;
pub mod issue;
pub mod review;
