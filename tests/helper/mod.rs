#![allow(dead_code)]

pub mod archive;

pub use archive::*;
