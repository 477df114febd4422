//! Reviva - A multi-tenant business review platform
//!
//! This library provides the core functionality for the Reviva backend:
//! accounts, sessions, and token auth; businesses with categories and
//! photo/video attachments; reviews; and the HTTP API over them.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
