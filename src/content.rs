//! Content negotiation for output devices.
//!
//! A writable device declared with content type `message/http` or
//! `message/cgi` produces an HTTP response rather than raw bytes. The
//! runtime parses that response and forwards only a whitelisted subset of
//! its headers to the storage write or the client response; the compiler's
//! job is to tag each output device with the mode the runtime must apply.

use serde::Serialize;

/// Content type marking a device as an NPH HTTP response producer.
pub const MESSAGE_HTTP: &str = "message/http";

/// Content type marking a device as a CGI/1.1 response producer.
pub const MESSAGE_CGI: &str = "message/cgi";

const META_HEADER_PREFIX: &str = "x-object-meta-";

/// How the runtime must interpret the bytes a device produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentMode {
    /// Bytes are stored or returned as-is.
    #[default]
    Raw,
    /// `message/http`: a full NPH response, status line included.
    HttpNph,
    /// `message/cgi`: CGI/1.1 headers, status line supplied by the runtime.
    Cgi,
}

impl ContentMode {
    /// Mode for a writable device with the given declared content type.
    pub fn from_content_type(content_type: Option<&str>) -> ContentMode {
        match content_type {
            Some(MESSAGE_HTTP) => ContentMode::HttpNph,
            Some(MESSAGE_CGI) => ContentMode::Cgi,
            _ => ContentMode::Raw,
        }
    }

    /// Whether the device's output needs HTTP response parsing.
    pub fn is_message(self) -> bool {
        self != ContentMode::Raw
    }
}

/// Whether a response header produced by a message device survives header
/// extraction. Only `Content-Type` and `X-Object-Meta-*` are forwarded;
/// matching is case-insensitive.
pub fn is_forwarded_header(name: &str) -> bool {
    name.eq_ignore_ascii_case("content-type") || strip_meta_prefix(name).is_some()
}

/// Strip the `X-Object-Meta-` prefix from a header name, lowercased, for
/// propagation as object metadata. Returns `None` for non-meta headers.
pub fn strip_meta_prefix(name: &str) -> Option<String> {
    let prefix = name.get(..META_HEADER_PREFIX.len())?;
    if prefix.eq_ignore_ascii_case(META_HEADER_PREFIX) {
        Some(name[META_HEADER_PREFIX.len()..].to_ascii_lowercase())
    } else {
        None
    }
}
