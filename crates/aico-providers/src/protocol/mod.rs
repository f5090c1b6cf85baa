//! Backend wire formats

pub mod openai;
