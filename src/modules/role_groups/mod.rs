pub mod service;

pub use service::RoleGroupService;
