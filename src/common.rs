pub mod cipher;
pub mod error;
