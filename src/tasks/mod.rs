//! Background Tasks Module
//!
//! Contains background tasks that run alongside the cache.
//!
//! # Tasks
//! - Sweeper: evicts expired cache entries at a fixed interval

mod sweeper;

pub use sweeper::SweeperHandle;
