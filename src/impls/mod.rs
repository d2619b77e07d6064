//! Device backends.

#[cfg(feature = "dummy")]
mod dummy;
#[cfg(feature = "dummy")]
pub use dummy::Dummy;

#[cfg(all(feature = "soapy", not(target_arch = "wasm32")))]
mod soapy;
#[cfg(all(feature = "soapy", not(target_arch = "wasm32")))]
pub use soapy::Soapy;
