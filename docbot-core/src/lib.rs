#![doc = "docbot-core: core logic library for docbot."]

//! This crate contains the whole documentation pipeline: collecting and aggregating
//! source files, sending them to a chat model, and delivering the reply.
//!
//! # Usage
//! The `docbot` CLI crate wires these modules together; integration tests drive them
//! directly, with `MockChatService` standing in for a model.

pub mod chat;
pub mod contract;
pub mod files;
pub mod ollama;
pub mod response;
