//! Protocol Module
//!
//! Defines the wire protocol exchanged between clients, storage servers,
//! and the shard controller.
//!
//! ## Frame Format
//! ```text
//! ┌──────────┬─────────────────────────────┐
//! │ Len (4)  │     Payload (bincode)       │
//! └──────────┴─────────────────────────────┘
//! ```
//!
//! The payload is a bincode-encoded [`Request`] or [`Response`]. One request
//! per round trip; the variant closes over every operation either endpoint
//! supports, so server-side dispatch is an exhaustive match. Requests aimed
//! at the wrong endpoint (a storage request at the controller, or vice
//! versa) come back as [`Response::Error`].

mod codec;
mod message;

pub use codec::{
    decode_request, decode_response, encode_request, encode_response, read_request,
    read_response, write_request, write_response, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
pub use message::{Request, Response};
