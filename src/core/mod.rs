//! Core library components.
//!
//! This module contains the reusable logic: key expansion, the Vault
//! client, manifest construction, encryption and configuration handling.

pub mod config;
pub mod constants;
pub mod encrypt;
pub mod expand;
pub mod manifest;
pub mod validation;
pub mod vault;
