//! Locates the structured payload inside a response envelope.
//!
//! The remote answers with an XML-RPC document whose single string value is
//! the JSON resource pool. Rather than parsing the XML, the payload is taken
//! greedily: from the first `{` in the text to the last `}`, inclusive. This
//! is only correct while the envelope carries no braces of its own outside the
//! payload, which holds for the responses the cluster info server produces.

use crate::errors::EnvelopeNotFound;

/// Returns the slice of `raw` running from its first `{` to its last `}`.
pub fn extract(raw: &str) -> Result<&str, EnvelopeNotFound> {
    let start = raw.find('{').ok_or(EnvelopeNotFound)?;
    let end = raw.rfind('}').ok_or(EnvelopeNotFound)?;

    if end < start {
        return Err(EnvelopeNotFound);
    }

    // both delimiters are single-byte, so the bounds are char boundaries
    Ok(&raw[start..=end])
}
