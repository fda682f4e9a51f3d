pub mod client;
pub mod error;
pub mod server;
mod transport;
pub mod types;

pub use client::ClientHandle;
pub use error::LspError;
pub use server::{run, Server};
pub use transport::{MessageReader, MessageWriter};
