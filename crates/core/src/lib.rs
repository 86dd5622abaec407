pub mod catalog;
pub mod detection;
pub mod registry;
pub mod rendering;
pub mod session;
pub mod shared;
pub mod video;
