pub mod error;
pub mod namespace;
pub mod registry;

pub use error::RegistryError;
pub use namespace::Namespace;
pub use registry::{EXTENSION_POINT_VERSION, ExtensionRecord, ExtensionRegistry};
