pub mod action;
pub mod collection;
pub mod error;
pub mod notifier;
pub mod reducer;
pub mod state;
pub mod store;

pub use action::Action;
pub use collection::BlockList;
pub use error::StoreError;
pub use notifier::{ChangeLog, ListChange, ListNotifier, NoopNotifier};
pub use reducer::{Reduction, reduce};
pub use state::State;
pub use store::{Dispatched, Store};
