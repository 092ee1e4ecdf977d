//! Turning the arguments of a call into request components.
//!
//! - [`binder`] attaches each live argument to the component it is declared for,
//! - [`placeholder`] resolves `{name}` / `${name}` / `${name:default}` tokens in templates,
//! - [`query`] merges static query pairs with leftover bindings and assembles the URL,
//! - [`headers`] does the same for header templates.
//!
//! All of these are pure transforms: no I/O, no shared state.

pub mod binder;
pub use self::binder::{Bindings, ParamBinding, bind};

pub mod placeholder;
pub use self::placeholder::{ConsumedKeys, Position};

pub mod query;

pub mod headers;
pub use self::headers::RequestHeaders;

pub(crate) mod value;
pub use self::value::ArgValue;
