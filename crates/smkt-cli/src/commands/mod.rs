pub mod clear;
pub mod inspect;
