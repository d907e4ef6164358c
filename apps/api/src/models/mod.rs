pub mod admin;
pub mod program;
pub mod student;
