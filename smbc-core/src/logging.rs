//! Logging facade.
//!
//! With the `tracing` feature the event macros are the ones from `tracing`. Without it
//! they expand to nothing, so call sites never need their own `cfg` guards. Arguments
//! are not evaluated in the disabled build.

#[cfg(feature = "tracing")]
pub use tracing::{debug, error, info, trace, warn};

#[cfg(not(feature = "tracing"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __smbc_disabled_event {
    ($($t:tt)*) => {()};
}

#[cfg(not(feature = "tracing"))]
pub use crate::__smbc_disabled_event as trace;
#[cfg(not(feature = "tracing"))]
pub use crate::__smbc_disabled_event as debug;
#[cfg(not(feature = "tracing"))]
pub use crate::__smbc_disabled_event as info;
#[cfg(not(feature = "tracing"))]
pub use crate::__smbc_disabled_event as warn;
#[cfg(not(feature = "tracing"))]
pub use crate::__smbc_disabled_event as error;
