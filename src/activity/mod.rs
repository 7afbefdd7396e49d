pub mod analyzer;
pub mod data;
pub mod endpoints;
pub mod helpers;
