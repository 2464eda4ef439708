//! Label canonicalization and entity matching.
//!
//! - text normalization (`normalize`)
//! - commodity alias resolution (`synonyms`)
//! - loose same-entity predicates (`loose`)

pub mod loose;
pub mod normalize;
pub mod synonyms;

pub use loose::*;
pub use normalize::*;
pub use synonyms::*;
