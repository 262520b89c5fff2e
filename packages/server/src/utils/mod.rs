pub mod hash;
pub mod jwt;
pub mod student_id;
pub mod upload;
