//! Service layer: caches, executors, sanitization, controller resolution.

pub mod controller;
pub mod executor;
pub mod identity_cache;
pub mod sanitizer;

pub use executor::{executor_for, Executor, InlineExecutor, PooledExecutor, MAX_POOL_SIZE};
pub use identity_cache::IdentityCache;
pub use sanitizer::Sanitizer;
