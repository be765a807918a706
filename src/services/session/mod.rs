pub mod memory;
pub mod store;
pub mod valkey;

pub use memory::MemorySessionStore;
pub use store::{Session, SessionError, SessionStore};
pub use valkey::ValkeySessionStore;
