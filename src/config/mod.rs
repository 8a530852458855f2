pub mod schema;
#[cfg(test)]
pub(crate) mod test_env;

pub use schema::{CompanionConfig, Config, OfflineConfig, RemoteConfig, SessionConfig};
