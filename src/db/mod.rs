pub mod memory;
pub mod pool;
pub mod store;

pub use memory::MemoryMoodStore;
pub use pool::create_pool;
pub use store::{MoodStore, PgMoodStore};
