/// Persistence layer for Taskdesk
///
/// # Modules
///
/// - `store`: the [`store::UserStore`] / [`store::TaskStore`] traits and [`store::StoreError`]
/// - `postgres`: PostgreSQL implementation over `sqlx`
/// - `memory`: in-process implementation (development and tests)
/// - `pool`: PostgreSQL connection pool management
/// - `migrations`: embedded schema migrations
///
/// # Example
///
/// ```
/// use taskdesk_shared::db::memory::MemoryStore;
/// use taskdesk_shared::db::store::StoreHealth;
///
/// let store = MemoryStore::new();
/// assert_eq!(store.backend(), "memory");
/// ```

pub mod memory;
pub mod migrations;
pub mod pool;
pub mod postgres;
pub mod store;
