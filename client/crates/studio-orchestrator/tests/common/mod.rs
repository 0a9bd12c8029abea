#![allow(unused_imports)]

pub(crate) mod fake_backend;

pub use fake_backend::*;
