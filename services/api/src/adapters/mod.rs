pub mod credentials;
pub mod db;

pub use credentials::Argon2Hasher;
pub use db::DbAdapter;
