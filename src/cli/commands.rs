pub mod create_group;
pub mod initdb;
pub mod migrate_and_serve;
pub mod serve;

pub use create_group::create_group;
pub use initdb::init_database;
pub use migrate_and_serve::migrate_and_serve;
pub use serve::serve;
