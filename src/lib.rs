pub mod actor;
pub mod common;
pub mod group;
pub mod model;
pub mod sys;
pub mod window;
