//! Repository traits for the data access layer
//!
//! Services read and write accounts only through [`AccountRepository`], so the
//! security logic can run against SQLite, another database or the in-memory
//! implementation used in tests.

pub mod account;
pub mod memory;

pub use account::AccountRepository;
pub use memory::InMemoryAccountRepository;
