//! Catalog services: service groups, services and price packages.

pub mod groups;
pub mod packages;
pub mod services;
