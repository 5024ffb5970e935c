//! CRM backend: actix-web API over an embedded SQLite store, with JWT-cookie
//! authentication, sequential/initials code generation and Excel/CSV
//! import-export.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod excel;
pub mod job_controller;
pub mod services;
