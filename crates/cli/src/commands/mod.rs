pub mod chat;
pub mod daemon;
pub mod gateway;
pub mod onboard;
pub mod pair;
pub mod status;
