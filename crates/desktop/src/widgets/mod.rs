pub mod action_button;
pub mod dashed_container;
