//! Mapping between Kafka headers and correlation metadata.

use post_bridge_core::transport::{CORRELATION_ID_HEADER, CorrelationContext, OutgoingMessage};
use rdkafka::message::{Header, Headers, OwnedHeaders};

/// Read the reply topic and correlation token from a message's headers.
///
/// A message without headers yields an empty context.
pub fn correlation_context<H: Headers>(headers: Option<&H>) -> CorrelationContext {
    headers.map_or_else(CorrelationContext::none, |headers| {
        CorrelationContext::from_headers(headers.iter().map(|header| (header.key, header.value)))
    })
}

/// Headers for an outgoing reply: the caller's correlation token, unchanged.
pub fn reply_headers(message: &OutgoingMessage) -> OwnedHeaders {
    OwnedHeaders::new().insert(Header {
        key: CORRELATION_ID_HEADER,
        value: Some(&message.correlation_id),
    })
}
