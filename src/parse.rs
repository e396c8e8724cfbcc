//! Response body decoding.
//!
//! A successful network exchange still has to yield the caller's declared
//! shape. [`parse_body`] decodes JSON bytes into any `DeserializeOwned`
//! type; [`NoContent`] is the marker shape for operations where only
//! success matters — it always parses, whatever the server sent back.

use crate::error::ParseError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::any::Any;

/// Marker shape for responses whose body is irrelevant.
///
/// Requesting `NoContent` makes parsing always succeed with this single
/// canonical value, even when the server did send a body. Use it for
/// DELETE-style operations and 204 responses.
///
/// # Examples
///
/// ```no_run
/// use courier::{Client, NoContent, RequestDescriptor};
///
/// # async fn example() -> Result<(), courier::Error> {
/// # let client = Client::builder("https://api.example.com").build()?;
/// client
///     .execute::<NoContent>(RequestDescriptor::delete("/users/123"))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct NoContent;

/// Decodes response bytes into `T`.
///
/// Empty bytes are an error for every shape except [`NoContent`]: a shape
/// that expects structured data cannot be satisfied by nothing. Decode
/// failures of any kind — syntax, type mismatch, missing field — are
/// classified uniformly as [`ParseError::Decode`] with the cause attached.
pub(crate) fn parse_body<T>(bytes: &[u8]) -> std::result::Result<T, ParseError>
where
    T: DeserializeOwned + 'static,
{
    // The downcast only succeeds when T is the NoContent marker itself;
    // any other shape falls through to the decoder.
    if let Ok(marker) = (Box::new(NoContent) as Box<dyn Any>).downcast::<T>() {
        return Ok(*marker);
    }

    if bytes.is_empty() {
        return Err(ParseError::NoData);
    }

    serde_json::from_slice(bytes).map_err(ParseError::Decode)
}
