// ─── Mod Updater Core ───
// Resolution-and-update engine for a folder of Modrinth-hosted mods.
//
// Architecture:
//   core/
//     hashing/    — SHA-1 content digests + mod file enumeration
//     catalog/    — Modrinth payload types + CatalogClient trait
//     version/    — Game version gate (latest release / exact match)
//     resolver/   — Local file → catalog project, prior version inference
//     matcher/    — Best update per mod (bulk + per-project)
//     archive     — Moves the old mod set into a version folder
//     downloader/ — Streaming, cancellable file downloads
//     updater     — Run pipeline and summary

pub mod archive;
pub mod catalog;
pub mod config;
pub mod downloader;
pub mod error;
pub mod hashing;
pub mod http;
pub mod loader;
pub mod matcher;
pub mod resolver;
pub mod updater;
pub mod version;

#[cfg(test)]
pub(crate) mod test_fixtures;
