//! Comment content validation.

pub mod validator;

pub use validator::ContentValidator;
