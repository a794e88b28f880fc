//! Upstream download proxy.
//!
//! Streams a direct URL back to the client in fixed-size chunks, forwarding
//! only the headers the upstream host needs to honor the link.

use std::collections::HashMap;

use axum::body::Body;
use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream, Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, warn};

/// Request headers passed through to the upstream host.
pub const FORWARDED_HEADERS: &[&str] = &["User-Agent", "Cookie", "Referer"];

/// Size of each chunk sent to the client.
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Keep only the safelisted headers (matched case-insensitively).
pub fn forwarded_headers(headers: &HashMap<String, String>) -> HeaderMap {
    let mut forwarded = HeaderMap::new();
    for (name, value) in headers {
        if !FORWARDED_HEADERS
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(name))
        {
            continue;
        }
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                forwarded.insert(name, value);
            }
            _ => debug!("Dropping unencodable header {}", name),
        }
    }
    forwarded
}

/// Regroup a byte stream into `chunk_size` pieces (the last may be shorter).
///
/// A transport error ends the stream after whatever was already buffered.
pub fn rechunk<S, E>(
    inner: S,
    chunk_size: usize,
) -> impl Stream<Item = std::io::Result<Bytes>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin + 'static,
    E: std::fmt::Display + Send + 'static,
{
    stream::unfold(Some((inner, BytesMut::new())), move |state| async move {
        let (mut inner, mut buf) = state?;
        loop {
            if buf.len() >= chunk_size {
                let chunk = buf.split_to(chunk_size).freeze();
                return Some((Ok::<Bytes, std::io::Error>(chunk), Some((inner, buf))));
            }
            match inner.next().await {
                Some(Ok(bytes)) => buf.extend_from_slice(&bytes),
                Some(Err(e)) => {
                    warn!("Proxy download error: {}", e);
                    break;
                }
                None => break,
            }
        }

        if buf.is_empty() {
            None
        } else {
            Some((Ok(buf.freeze()), None))
        }
    })
}

async fn open_upstream(
    client: reqwest::Client,
    url: String,
    headers: HeaderMap,
) -> Option<BoxStream<'static, reqwest::Result<Bytes>>> {
    match client.get(&url).headers(headers).send().await {
        Ok(response) if response.status() == reqwest::StatusCode::OK => {
            Some(response.bytes_stream().boxed())
        }
        Ok(response) => {
            warn!("Upstream error: {} from {}", response.status(), url);
            None
        }
        Err(e) => {
            warn!("Proxy download error: {}", e);
            None
        }
    }
}

/// Response body that streams `url` from upstream.
///
/// Upstream failures are logged and produce an empty body.
pub fn upstream_body(
    client: reqwest::Client,
    url: String,
    headers: &HashMap<String, String>,
) -> Body {
    let headers = forwarded_headers(headers);
    let chunks = stream::once(open_upstream(client, url, headers)).flat_map(|upstream| {
        match upstream {
            Some(bytes) => rechunk(bytes, CHUNK_SIZE).boxed(),
            None => stream::empty().boxed(),
        }
    });
    Body::from_stream(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_safelisted_headers_forwarded() {
        let mut headers = HashMap::new();
        headers.insert("User-Agent".to_string(), "ua".to_string());
        headers.insert("cookie".to_string(), "ndus=1".to_string());
        headers.insert("Referer".to_string(), "https://1024tera.com/s/1".to_string());
        headers.insert("Accept-Language".to_string(), "en".to_string());
        headers.insert("Authorization".to_string(), "Bearer x".to_string());

        let forwarded = forwarded_headers(&headers);
        assert_eq!(forwarded.len(), 3);
        assert_eq!(forwarded["user-agent"], "ua");
        assert_eq!(forwarded["cookie"], "ndus=1");
        assert!(forwarded.get("authorization").is_none());
    }

    #[tokio::test]
    async fn test_rechunk_fixed_sizes() {
        let pieces: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"abc")),
            Ok(Bytes::from_static(b"defgh")),
            Ok(Bytes::from_static(b"ij")),
        ];
        let chunks: Vec<Bytes> = rechunk(stream::iter(pieces), 4)
            .map(|c| c.unwrap())
            .collect()
            .await;
        assert_eq!(chunks, vec![&b"abcd"[..], &b"efgh"[..], &b"ij"[..]]);
    }

    #[tokio::test]
    async fn test_rechunk_stops_at_error() {
        let pieces: Vec<Result<Bytes, String>> = vec![
            Ok(Bytes::from_static(b"ab")),
            Err("connection reset".to_string()),
            Ok(Bytes::from_static(b"never")),
        ];
        let chunks: Vec<Bytes> = rechunk(stream::iter(pieces), 4)
            .map(|c| c.unwrap())
            .collect()
            .await;
        assert_eq!(chunks, vec![&b"ab"[..]]);
    }
}
