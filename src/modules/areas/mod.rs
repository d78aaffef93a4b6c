//! Role-gated areas for teachers and students.

pub mod controller;
pub mod router;

pub use router::{init_student_router, init_teacher_router};
