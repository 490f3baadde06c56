pub mod catalog;
pub mod chunker;
pub mod document;
pub mod text;
