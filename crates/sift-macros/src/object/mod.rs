//! Implementation of the `#[derive(Object)]` macro.
//!
//! This module generates `sift::Object` implementations and property name
//! constants from struct annotations.

mod attrs;
mod derive;

pub use derive::object_derive_impl;
