use crate::context::RemarxContext;
use crate::db::driver::DatabaseDriver;

/// Process-wide resources handed to every command.
pub struct Runtime {
    pub context: RemarxContext,
    /// Backing store of the persistent embedding cache.
    pub cache_db: DatabaseDriver,
}

impl Runtime {
    /// Runtime backed by the cache database file named in `context`.
    pub fn new(context: RemarxContext) -> Self {
        let cache_db = DatabaseDriver::file(context.cache_db_path().to_path_buf());
        Self { context, cache_db }
    }
}
