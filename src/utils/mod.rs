//! Shared helpers.

pub mod entity;
