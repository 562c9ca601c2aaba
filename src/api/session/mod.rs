pub mod client_session;

pub use client_session::{ClientSession, Session, SpaceInfo};
