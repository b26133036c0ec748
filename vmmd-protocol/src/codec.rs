//! Encoding and decoding for the one-request-per-connection exchange.
//!
//! There is no framing: the daemon performs a single read of up to
//! [`READ_BUFFER_SIZE`] bytes per connection and treats an empty or
//! exactly-full read as a failed exchange. Requests at or above the buffer
//! size are therefore dropped rather than reported to the caller; this is a
//! documented limitation of the protocol.

use crate::error::ProtocolError;
use crate::message::Request;
use bytes::BytesMut;
use serde_json::Value;

/// Size of the single read performed per connection.
pub const READ_BUFFER_SIZE: usize = 1024;

/// Decodes the request held in the first `n` bytes of `buf`.
///
/// Refuses an empty read and a read that filled the buffer exactly (the
/// message may continue past what was read). Both are read failures: the
/// connection is abandoned without a response.
pub fn decode_request(buf: &[u8], n: usize) -> Result<Request, ProtocolError> {
    if n == 0 {
        return Err(ProtocolError::EmptyRead);
    }
    if n >= buf.len() {
        return Err(ProtocolError::Truncated { limit: buf.len() });
    }
    Ok(serde_json::from_slice(&buf[..n])?)
}

/// Encodes a request envelope for sending.
pub fn encode_request(request: &Request) -> Result<BytesMut, ProtocolError> {
    let bytes = serde_json::to_vec(request)?;
    Ok(BytesMut::from(&bytes[..]))
}

/// Encodes a handler result payload verbatim. Success shapes are owned by
/// the handler and are never re-wrapped.
pub fn encode_result(payload: &Value) -> BytesMut {
    BytesMut::from(payload.to_string().as_bytes())
}

/// Encodes the error envelope, the sole error shape on the wire.
pub fn encode_error(message: &str) -> BytesMut {
    BytesMut::from(serde_json::json!({ "Error": message }).to_string().as_bytes())
}

/// Decodes a response payload client-side.
pub fn decode_result(bytes: &[u8]) -> Result<Value, ProtocolError> {
    if bytes.is_empty() {
        return Err(ProtocolError::EmptyRead);
    }
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read_into(buf: &mut [u8], data: &[u8]) -> usize {
        buf[..data.len()].copy_from_slice(data);
        data.len()
    }

    #[test]
    fn test_decode_request() {
        let mut buf = [0u8; READ_BUFFER_SIZE];
        let n = read_into(&mut buf, br#"{"command":"start","args":{"name":"vm0"}}"#);
        let req = decode_request(&buf, n).unwrap();
        assert_eq!(req.command, "start");
        assert_eq!(req.args.get("name").map(String::as_str), Some("vm0"));
    }

    #[test]
    fn test_decode_refuses_empty_read() {
        let buf = [0u8; READ_BUFFER_SIZE];
        assert!(matches!(
            decode_request(&buf, 0),
            Err(ProtocolError::EmptyRead)
        ));
    }

    #[test]
    fn test_decode_refuses_full_buffer() {
        let buf = [b'x'; READ_BUFFER_SIZE];
        assert!(matches!(
            decode_request(&buf, READ_BUFFER_SIZE),
            Err(ProtocolError::Truncated { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_malformed_json() {
        let mut buf = [0u8; READ_BUFFER_SIZE];
        let n = read_into(&mut buf, b"{not json");
        assert!(matches!(
            decode_request(&buf, n),
            Err(ProtocolError::Json(_))
        ));
    }

    #[test]
    fn test_encode_error_shape() {
        let bytes = encode_error("queue full");
        assert_eq!(&bytes[..], br#"{"Error":"queue full"}"#);
    }

    #[test]
    fn test_result_roundtrip_preserves_payload() {
        let payload = json!({
            "Name": "vmmd",
            "Status": "Running",
            "Success": true,
        });
        let encoded = encode_result(&payload);
        let decoded = decode_result(&encoded).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_request_roundtrip() {
        let request = Request::new("setconfig").with_arg("cpus", "4");
        let encoded = encode_request(&request).unwrap();
        let mut buf = [0u8; READ_BUFFER_SIZE];
        buf[..encoded.len()].copy_from_slice(&encoded);
        let decoded = decode_request(&buf, encoded.len()).unwrap();
        assert_eq!(decoded.command, "setconfig");
        assert_eq!(decoded.args.get("cpus").map(String::as_str), Some("4"));
    }

    #[test]
    fn test_decode_result_empty() {
        assert!(matches!(decode_result(b""), Err(ProtocolError::EmptyRead)));
    }
}
