//! Conversion of document text into content safe to render on screen

pub mod markdown;
pub mod pipeline;
pub mod sanitize;
