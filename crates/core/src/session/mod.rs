pub mod detection_session;
