pub mod college;
pub mod program;
pub mod student;
pub mod user;
