pub mod domain;
pub mod lifecycle;
pub mod protocol;
