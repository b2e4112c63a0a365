//! Model catalog
//!
//! Replaces per-component switch statements (model name to icon, color,
//! provider) with one typed table. The catalog also owns the fallback
//! policy: every model names the single model to try after it fails.

mod provider;
mod model;
mod registry;

pub use provider::ProviderKind;
pub use model::ModelInfo;
pub use registry::{CatalogError, CatalogResult, ModelCatalog};
