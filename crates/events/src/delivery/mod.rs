//! External delivery channels: operator webhook and client email.

pub mod email;
pub mod webhook;
