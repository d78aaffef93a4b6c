pub mod areas;
pub mod auth;
pub mod groups;
pub mod me;
pub mod metrics;
pub mod role_groups;
pub mod users;
