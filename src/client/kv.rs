//! Per-server storage client
//!
//! Speaks the store-facing protocol to a single storage server, one request
//! per round trip. Not-found is a negative result (`Ok(None)`), not an
//! error; unexpected response variants are protocol errors.

use crate::error::{Result, ShardKvError};
use crate::network::Connection;
use crate::protocol::{Request, Response};

/// Client for one storage server.
pub struct KvClient {
    conn: Connection,
}

impl KvClient {
    /// Connect to a storage server.
    pub fn connect(addr: &str) -> Result<Self> {
        Ok(Self {
            conn: Connection::connect(addr)?,
        })
    }

    /// Get the value for `key`. `Ok(None)` if the key is absent.
    pub fn get(&mut self, key: &str) -> Result<Option<String>> {
        let response = self.conn.round_trip(&Request::Get {
            key: key.to_string(),
        })?;
        match response {
            Response::Get { value } => Ok(Some(value)),
            Response::NotFound => Ok(None),
            other => Err(unexpected("Get", &other)),
        }
    }

    /// Insert or overwrite `key`.
    pub fn put(&mut self, key: &str, value: &str) -> Result<()> {
        let response = self.conn.round_trip(&Request::Put {
            key: key.to_string(),
            value: value.to_string(),
        })?;
        match response {
            Response::Put => Ok(()),
            other => Err(unexpected("Put", &other)),
        }
    }

    /// Append `value` to the value for `key` (insert if absent).
    pub fn append(&mut self, key: &str, value: &str) -> Result<()> {
        let response = self.conn.round_trip(&Request::Append {
            key: key.to_string(),
            value: value.to_string(),
        })?;
        match response {
            Response::Append => Ok(()),
            other => Err(unexpected("Append", &other)),
        }
    }

    /// Delete `key`, returning the old value. `Ok(None)` if it was absent.
    pub fn delete(&mut self, key: &str) -> Result<Option<String>> {
        let response = self.conn.round_trip(&Request::Delete {
            key: key.to_string(),
        })?;
        match response {
            Response::Delete { value } => Ok(Some(value)),
            Response::NotFound => Ok(None),
            other => Err(unexpected("Delete", &other)),
        }
    }

    /// Get several keys atomically. `Ok(None)` if any key is absent.
    pub fn multi_get(&mut self, keys: &[String]) -> Result<Option<Vec<String>>> {
        let response = self.conn.round_trip(&Request::MultiGet {
            keys: keys.to_vec(),
        })?;
        match response {
            Response::MultiGet { values } => Ok(Some(values)),
            Response::NotFound => Ok(None),
            other => Err(unexpected("MultiGet", &other)),
        }
    }

    /// Put several key-value pairs atomically.
    pub fn multi_put(&mut self, keys: &[String], values: &[String]) -> Result<()> {
        let response = self.conn.round_trip(&Request::MultiPut {
            keys: keys.to_vec(),
            values: values.to_vec(),
        })?;
        match response {
            Response::MultiPut => Ok(()),
            other => Err(unexpected("MultiPut", &other)),
        }
    }
}

fn unexpected(operation: &str, response: &Response) -> ShardKvError {
    match response {
        Response::Error { message } => ShardKvError::Request(message.clone()),
        other => ShardKvError::Protocol(format!(
            "unexpected response to {operation}: {other:?}"
        )),
    }
}
