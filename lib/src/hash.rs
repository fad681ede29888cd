//! Metadata fingerprints.
//!
//! A fingerprint is the lowercase hex MD5 of a payload. It detects changes to
//! the fields that show up on listing pages; it is not a security digest.

use md5::{Digest, Md5};

const FIELD_SEPARATOR: &str = "|";

/// Hex MD5 of `payload`.
pub fn digest(payload: &str) -> String {
    format!("{:x}", Md5::digest(payload.as_bytes()))
}

/// Fingerprint of an ordered list of fields. Each field is trimmed before the
/// fields are joined, so surrounding whitespace never changes the result.
pub fn metadata_hash<'a, I>(fields: I) -> String
    where I: IntoIterator<Item = &'a str>
{
    let payload = fields.into_iter()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(FIELD_SEPARATOR);

    digest(&payload)
}
