pub mod client;
pub mod dto;
pub mod recognition_client;
