pub mod client;
pub mod mapper;
pub mod session;
pub mod types;

pub use client::SupabaseClient;
pub use session::Session;
