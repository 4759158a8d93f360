pub mod branch;
pub mod brew;
pub mod issue;
pub mod project_key;
pub mod taste;
