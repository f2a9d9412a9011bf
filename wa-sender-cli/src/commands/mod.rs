pub mod bulk;
pub mod send;

pub use bulk::BulkCommand;
pub use send::SendCommand;
