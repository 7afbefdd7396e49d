pub mod data;
pub mod endpoints;
pub mod generator;
pub mod helpers;
