//! Plain-text rendering of the list, detail and cache views.

pub mod render;
