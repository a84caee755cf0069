//! External API integrations

pub mod sayariq;

pub use sayariq::{ForwardedResponse, SayariqClient};
