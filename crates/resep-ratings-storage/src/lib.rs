//! resep-ratings-storage: Store backends for resep-ratings

mod memory;

pub use memory::MemoryStore;
