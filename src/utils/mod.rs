pub mod cache;
pub mod content_type;
pub mod keyed_mutex;
pub mod range;
pub mod validation;
