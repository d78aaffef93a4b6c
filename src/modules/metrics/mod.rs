pub mod controller;
pub mod router;

pub use router::{init_metrics_router, init_ws_router};
