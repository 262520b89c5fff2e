pub mod auth;
pub mod college;
pub mod logs;
pub mod program;
pub mod shared;
pub mod student;
