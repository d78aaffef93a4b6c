//! Private groups and their members.
//!
//! Admins manage every group. Teachers manage the groups they hold the
//! `TEACHER` member role in, and may only add or remove students. Students
//! read the groups they belong to. Role groups are readable but not
//! editable here.

pub mod controller;
pub mod router;
pub mod service;

pub use router::{init_admin_groups_router, init_student_groups_router, init_teacher_groups_router};
pub use service::GroupService;
