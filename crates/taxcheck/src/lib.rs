//! Tax estimation core: constants tables, bracket math, the filing computation, the
//! compliance rule catalog, and interview gap questions, plus the session service and
//! HTTP routes built on them.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
