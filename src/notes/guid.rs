//! Stable note identifiers derived from field content

use sha2::{Digest, Sha256};

/// Separator placed between field values before hashing
const FIELD_SEPARATOR: &str = "\x1f";

/// Base91 alphabet; excludes characters unsafe in the collection's guid column
const BASE91_TABLE: &[u8; 91] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!#$%&()*+,-./:;<=>?@[]^_`{|}~";

/// GUID for a sequence of field values. Identical sequences always produce
/// identical GUIDs.
pub fn guid_for_fields(fields: &[String]) -> String {
    generate_guid(fields.join(FIELD_SEPARATOR).as_bytes())
}

/// Hash `data` with SHA-256 and base91-encode the first eight bytes
pub fn generate_guid(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    encode_base91(u64::from_be_bytes(prefix))
}

/// Most significant digit first; zero encodes as the empty string.
fn encode_base91(mut value: u64) -> String {
    let mut out = Vec::new();
    while value != 0 {
        out.push(BASE91_TABLE[(value % 91) as usize]);
        value /= 91;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}
