pub mod conversation;
pub mod framework;
pub mod tenant;
