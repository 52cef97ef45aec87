//! Site-probe catalog: definition records, loading, and filtering

pub mod loader;

pub use loader::{
    apply_filters, load_catalog, parse_catalog, validate_definition, MarkerSet, ProbeDefinition,
};
