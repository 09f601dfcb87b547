// Application layer - the ledger use cases and their error type.
// Clients (HTTP, CLI) only ever talk to `LedgerService`.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
