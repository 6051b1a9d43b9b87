//! Internal implementation details.

pub(crate) mod call_chain;
pub(crate) mod dispose_bag;

#[cfg(feature = "async")]
pub use call_chain::call_chain;
pub(crate) use call_chain::with_call_chain;
pub(crate) use dispose_bag::DisposeBag;
