pub mod class_names;
pub mod detection;
pub mod object_detector;
