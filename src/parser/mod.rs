//! Decoders from input text into `serde_json::Value`; see [`crate::format::Format::decode`].

pub mod json;
pub mod yaml;
