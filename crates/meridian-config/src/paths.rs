//! File layout for the `_api` config-writer module and its stages
//! (spec §4.5: `_api/<activeStage>/conf.d/<typePlural-lower>/<escapedName>.conf`).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Characters forbidden in a path component on at least one of the
/// platforms a cluster node might run on. Escaped as `%XX` (uppercase hex),
/// the same scheme used to unescape them back to the original name.
const RESERVED: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Escapes reserved filesystem characters in an object's full name so it
/// can be used as a `.conf` file stem. Reversible via [`file_name_unescape`].
pub fn file_name_escape(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if RESERVED.contains(&c) || c == '%' {
            out.push_str(&format!("%{:02X}", c as u32));
        } else {
            out.push(c);
        }
    }
    out
}

/// Inverse of [`file_name_escape`]. Malformed `%XX` sequences are passed
/// through verbatim rather than rejected -- this is a display/staging
/// convenience, not a wire format.
///
/// `%XX` only ever encodes a single-byte ASCII codepoint (`file_name_escape`
/// only escapes `RESERVED` and `%`, all of which are ASCII), so unescaped
/// runs are collected as raw bytes and decoded as UTF-8 once at the end,
/// rather than reinterpreting each byte as its own `char` -- the latter
/// would mangle any multi-byte UTF-8 sequence in the original name.
pub fn file_name_unescape(escaped: &str) -> String {
    let bytes = escaped.as_bytes();
    let mut out = Vec::with_capacity(escaped.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(hex) = std::str::from_utf8(&bytes[i + 1..i + 3]) {
                if let Ok(byte) = u8::from_str_radix(hex, 16) {
                    out.push(byte);
                    i += 3;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// The single active stage directory name the writer ever targets. Stage
/// rotation (keeping prior stages for rollback) is a deployment concern of
/// the module loader, not of this writer.
pub const ACTIVE_STAGE: &str = "00000001";

/// Directory for one type's staged `.conf` files under the active stage,
/// creating it (and its parents) if necessary.
pub fn type_dir(module_dir: &Path, type_plural_lower: &str) -> io::Result<PathBuf> {
    let dir = module_dir
        .join("_api")
        .join(ACTIVE_STAGE)
        .join("conf.d")
        .join(type_plural_lower);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Full path to the staged `.conf` file for one object.
pub fn object_conf_path(
    module_dir: &Path,
    type_plural_lower: &str,
    full_name: &str,
) -> io::Result<PathBuf> {
    let dir = type_dir(module_dir, type_plural_lower)?;
    Ok(dir.join(format!("{}.conf", file_name_escape(full_name))))
}
