pub mod controls;
pub mod detected_list;
pub mod preview;
