//! Core HTTP protocol types shared by the codec and connection layers.
//!
//! - [`Message`]: a head or a complete buffered body
//! - [`PayloadSize`]: request body framing derived from the headers
//! - [`RequestHead`]: request line and headers
//! - [`ResponseHead`] and [`ReasonPhrase`]: status line and headers
//! - [`HttpError`], [`ParseError`], [`SendError`]: transport errors

mod message;
pub use message::Message;
pub use message::PayloadSize;

mod request;
pub use request::RequestHead;

mod response;
pub use response::ReasonPhrase;
pub use response::ResponseHead;
pub use response::error_response;
pub use response::reason_of;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
