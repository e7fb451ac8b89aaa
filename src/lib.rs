pub use tensorlist_internal::*;
