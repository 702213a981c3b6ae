#![doc = "site-forge-core: core logic library for site-forge."]

//! This crate contains the parsing, naming, publishing and ledger logic for site-forge.
//! Network clients for the generator and hosting services live in the `site-forge` crate
//! and plug in through the traits in [`contract`].
//!
//! # Usage
//! Depend on this crate for the pipeline and its building blocks; supply real or mocked
//! [`contract::Generator`] and [`contract::Host`] implementations.

pub mod artifact;
pub mod config;
pub mod contract;
pub mod error;
pub mod ledger;
pub mod naming;
pub mod pipeline;
pub mod publish;
