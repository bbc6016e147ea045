// Person mentions: case normalization and surname canonicalization.

pub mod canonicalize;

pub use canonicalize::{canonicalize, canonicalize_with, title_case, SurnamePolicy};
