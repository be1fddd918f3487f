//! Method stubbing: registries of developer-supplied behaviors and the
//! dispatcher that resolves a call against them or fails loudly.

mod dispatch;
mod method;
mod registry;


pub use dispatch::{CallLevel, CallSite, DispatchError, DispatchTarget, invoke};
pub use method::{Behavior, BindingMode, MockMethod, Receiver};
pub use registry::MethodRegistry;
