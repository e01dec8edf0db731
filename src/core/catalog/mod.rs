pub mod client;
pub mod model;

pub use client::{CatalogClient, ModrinthClient};
pub use model::{
    CatalogIdentity, CatalogVersion, GameVersionTag, ResolvedFile, VersionFile, VersionKind,
};
