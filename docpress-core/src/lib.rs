#![doc = "docpress-core: document assembly, rendering and cataloguing for docpress."]

//! This crate holds the whole render pipeline and the dashboard indexer; the
//! `docpress` binary only loads configuration and wires collaborators.
//!
//! # Usage
//! Build a [`pipeline::Pipeline`] from a markdown converter, a
//! [`template::DocumentShell`] and a [`publish::Publisher`], then hand it the
//! configured jobs. The indexer is independent: see
//! [`catalog_output::generate_catalog`].

pub mod addressing;
pub mod archive;
pub mod catalog;
pub mod catalog_output;
pub mod combine;
pub mod config;
pub mod contract;
pub mod embed;
pub mod error;
pub mod hydrate;
pub mod markdown;
pub mod pipeline;
pub mod publish;
pub mod render;
pub mod resolve;
pub mod template;
