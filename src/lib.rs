//! APRS packet parser and APRS-IS client.
//!
//! The parser turns one APRS frame (arbitrary 8-bit bytes, usually a single
//! line from an APRS-IS feed) into a normalized [`AprsPacket`] with SI
//! units, or a [`ParseError`] that reports where in the frame the decoder
//! gave up. Position reports (plain, compressed and Mic-E), status reports,
//! messages, objects, items, telemetry, weather and raw GPS sentences are
//! supported.
//!
//! # Usage
//!
//! ```rust
//! let packet = aprs_parser::parse(
//!     br"FROMCALL>TOCALL:!4903.50N/07201.75W-Test /A=001234",
//! )
//! .unwrap();
//!
//! assert_eq!(packet.from.as_str(), "FROMCALL");
//! let position = packet.position.unwrap();
//! assert!((position.latitude.unwrap().degrees - 49.0583).abs() < 1e-3);
//! assert!((position.altitude.unwrap() - 376.1232).abs() < 1e-6);
//! assert_eq!(packet.comment.as_deref(), Some(&b"Test /A=001234"[..]));
//! ```
//!
//! The [`client`] module streams frames from an APRS-IS server and hands
//! them to a callback; parsing stays the caller's decision, since real
//! feeds always contain some unparseable frames.

mod base91;
mod bytes;
mod callsign;
mod comment;
mod error;
mod extensions;
mod message;
mod mic_e;
mod object;
mod packet;
mod position;
mod scanner;
mod status;
mod symbol;
mod telemetry;
mod timestamp;
mod units;
mod weather;

pub mod client;
pub mod filter;

pub use callsign::Callsign;
pub use error::{DecodeError, ParseError};
pub use extensions::{Antenna, BearingAccuracy, Course, Directivity, ReportQuality};
pub use message::Message;
pub use object::{Target, TargetState};
pub use packet::{AprsPacket, parse};
pub use position::{Coordinate, Position, Precision};
pub use symbol::Symbol;
pub use telemetry::Telemetry;
pub use timestamp::{Clock, FixedClock, SystemClock, TimeZone, Timestamp};
pub use weather::{StormCategory, Weather};
