mod errors;
mod memory;
mod types;

pub use errors::StorageError;
pub use memory::InMemorySessionStore;
pub use types::SessionStore;
