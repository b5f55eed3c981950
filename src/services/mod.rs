pub mod conversation;
pub mod pricing;
pub mod session;
pub mod twiml;
