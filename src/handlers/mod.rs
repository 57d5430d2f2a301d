pub mod events;
pub mod ws;
