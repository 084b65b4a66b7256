pub mod daemon;
pub mod hash;
pub mod health;
pub mod identity;
pub mod init;
pub mod version;

pub use daemon::Daemon;
pub use hash::Hash;
pub use health::Health;
pub use identity::Identity;
pub use init::Init;
pub use version::Version;
