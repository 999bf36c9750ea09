pub mod get;
pub mod init;
pub mod nodes;
pub mod put;
pub mod version;

pub use get::Get;
pub use init::Init;
pub use nodes::Nodes;
pub use put::Put;
pub use version::Version;
