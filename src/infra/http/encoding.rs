use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything except RFC 3986 unreserved characters: ALPHA / DIGIT / "-" / "." / "_" / "~".
const RFC3986_UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Strict RFC 3986 percent-encoding, as OAuth 1.0a signing requires. Also
/// safe for interpolating user input into a URL path segment.
pub fn percent_encode(s: &str) -> String {
    utf8_percent_encode(s, RFC3986_UNRESERVED).to_string()
}
