//! Query encoding and response decoding per site charset.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::rules::TextEncoding;

/// Characters left unescaped by ECMAScript `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode `text` as UTF-8 with the `encodeURIComponent` unreserved set.
pub fn encode_uri_component(text: &str) -> String {
    utf8_percent_encode(text, URI_COMPONENT).to_string()
}

/// Encode `text` as GBK and escape every resulting byte as `%XX`.
///
/// ASCII bytes are escaped too; hex digits are uppercase.
pub fn encode_uri_gbk(text: &str) -> String {
    let (bytes, _, _) = encoding_rs::GBK.encode(text);
    let mut out = String::with_capacity(bytes.len() * 3);
    for byte in bytes.iter() {
        out.push('%');
        out.push_str(&format!("{byte:02X}"));
    }
    out
}

/// Encode a query for insertion into a site's URL template.
pub fn encode_query(text: &str, encoding: TextEncoding) -> String {
    match encoding {
        TextEncoding::Utf8 => encode_uri_component(text),
        TextEncoding::Gbk => encode_uri_gbk(text),
    }
}

/// Decode a response body. GBK sites are decoded with the GB18030 superset.
pub fn decode_body(bytes: &[u8], encoding: TextEncoding) -> String {
    match encoding {
        TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        TextEncoding::Gbk => {
            let (text, _, had_errors) = encoding_rs::GB18030.decode(bytes);
            if had_errors {
                tracing::debug!("GB18030 body contained malformed sequences");
            }
            text.into_owned()
        }
    }
}
