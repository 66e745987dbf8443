//! Object key generation
//!
//! Uploads land in storage under a synthetic name `image_<32 hex><.ext>` so
//! two uploads of `photo.jpg` never overwrite each other and no user-supplied
//! name ends up in a public URL. Passing the original name through is kept as
//! an opt-in policy for deployments that still rely on it.

use rand::Rng;

/// Which name an uploaded object is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyPolicy {
    /// `image_<random hex><.ext>`, collision resistant
    #[default]
    Generated,
    /// The client's filename. Two uploads with the same name overwrite each other.
    Original,
}

/// Generates a fresh storage key for `original_name`.
///
/// The extension is the lowercased text after the last `.` of the file name.
/// Names without one (`README`, `photo.`, `.hidden`) fall back to the
/// extension implied by `mime_type`, or no extension at all.
pub fn generate_key(original_name: &str, mime_type: &str) -> String {
    let hex: u128 = rand::rng().random();
    let ext = extension(original_name)
        .or_else(|| extension_for_mime(mime_type).map(str::to_string))
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();

    format!("image_{hex:032x}{ext}")
}

/// Applies `policy` to produce the key an upload is written under.
pub fn object_key(policy: KeyPolicy, original_name: &str, mime_type: &str) -> String {
    match policy {
        KeyPolicy::Generated => generate_key(original_name, mime_type),
        KeyPolicy::Original => match base_name(original_name) {
            "" => generate_key(original_name, mime_type),
            name => name.to_string(),
        },
    }
}

/// Lowercased extension of the final path segment, without the dot.
pub fn extension(original_name: &str) -> Option<String> {
    let name = base_name(original_name);
    match name.rfind('.') {
        // A leading dot marks a hidden file, not an extension.
        Some(0) | None => None,
        Some(idx) if idx + 1 == name.len() => None,
        Some(idx) => Some(name[idx + 1..].to_lowercase()),
    }
}

fn extension_for_mime(mime_type: &str) -> Option<&'static str> {
    match crate::validator::essence(mime_type).as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        _ => None,
    }
}

/// Strips any directory part a browser or client may have sent along.
fn base_name(original_name: &str) -> &str {
    original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_name)
        .trim()
}
