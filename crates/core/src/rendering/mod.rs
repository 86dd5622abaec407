pub mod annotator;
pub mod display;
