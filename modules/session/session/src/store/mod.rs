//! [`SessionDao`](session_sdk::SessionDao) implementations.

mod caching;
mod memory;

pub use caching::{ACTIVE_SESSION_CACHE, CachingSessionDao};
pub use memory::MemorySessionDao;
