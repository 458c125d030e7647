pub mod chain;
pub mod collision;
pub mod rest;
pub mod setup;
pub mod stability;
