#![allow(dead_code)]

pub mod config;
pub mod records;
pub mod source;
