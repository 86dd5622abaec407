pub mod class_registry;
