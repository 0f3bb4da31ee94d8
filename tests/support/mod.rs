#![allow(dead_code)]

pub mod learnonauts_env;
pub mod png;
