//! Core types shared by clients, tools and the binary: the error model.

pub mod error;
