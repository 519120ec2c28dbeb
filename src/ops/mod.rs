pub mod filters;
pub mod text;
pub mod transform;
