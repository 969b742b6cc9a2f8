//! Pure transformations: header parsing, naming and response checks.

mod disposition;
mod naming;
mod validation;

pub use disposition::{parse_filename, sanitize_filename};
pub use naming::{matches_set, mirror_url};
pub use validation::{is_acceptable_content_type, is_success};
