pub mod memory;
pub mod redis;
pub mod retry;

pub use memory::MemoryStore;
pub use self::redis::RedisStore;
