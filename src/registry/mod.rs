//! Registry document, registry builder and the remote registry client

pub mod builder;
pub mod document;
pub mod npm_client;

pub use builder::{ExportMap, RegistryBuilder, RegistryShape};
pub use document::{EntryFiles, RegistryDocument, RegistryEntry, SCHEMA_VERSION};
pub use npm_client::NpmRegistryClient;
