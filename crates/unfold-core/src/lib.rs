#![cfg_attr(not(test), no_std)]

//! Sentence-by-sentence disclosure engine with comprehension gates.
//!
//! The crate owns reveal position, gesture normalization and the question
//! gate. It never performs I/O: time is passed in as milliseconds, input comes
//! through [`input::InputProvider`], and persistence is left to callers via
//! [`store::KeyValueStore`].

extern crate alloc;

pub mod app;
pub mod content;
pub mod grading;
pub mod input;
pub mod ledger;
pub mod questions;
pub mod render;
pub mod store;
pub mod text_policy;
