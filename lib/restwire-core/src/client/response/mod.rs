//! Response handling: raw responses, content classification, typed decoding and header sinks.
//!
//! - [`RawResponse`] - bytes, headers and binary flag as received from a transport
//! - [`content`] - text vs binary classification of content types
//! - [`builder`] - decoding into the declared return type
//! - [`ResponseHeaders`] - side channel receiving response headers

pub mod content;
pub use self::content::ContentKind;

mod raw;
pub use self::raw::RawResponse;

pub mod builder;

mod sink;
pub use self::sink::ResponseHeaders;
