mod account;
mod ledger;
mod money;

pub use account::*;
pub use ledger::*;
pub use money::*;
