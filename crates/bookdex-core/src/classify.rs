//! Filename classification: split a name into a (title, type) pair using the
//! static MIME extension tables, and translate between logical titles and
//! on-disk names.

/// On-disk token standing in for a path separator inside a title.
///
/// The mapping is lossy if a raw filename legitimately contains the token;
/// that limitation is accepted.
pub const SEPARATOR_TOKEN: &str = "%2f";

const GZIP_SUFFIX: &str = ".gz";

/// Split a filename (no path) into `(title, type)`.
///
/// The type is the longest conventional extension for the file's MIME type
/// that actually suffixes the name, with the leading dot stripped; a gzip
/// transport suffix is folded in (`"tar.gz"`). Unknown or ambiguous names
/// yield an empty type and the whole filename as title, which is a valid
/// low-information classification rather than an error.
///
/// The returned title is the raw filename fragment; callers wanting the
/// logical title must pass it through [`decode_title`].
pub fn classify(filename: &str) -> (String, String) {
    let (lookup_name, gzip) = match filename.strip_suffix(GZIP_SUFFIX) {
        Some(stem) if !stem.is_empty() => (stem, true),
        _ => (filename, false),
    };

    if let Some(mime) = mime_guess::from_path(lookup_name).first_raw() {
        if let Some(extensions) = mime_guess::get_mime_extensions_str(mime) {
            for ext in extensions {
                let candidate = if gzip {
                    format!(".{}{}", ext, GZIP_SUFFIX)
                } else {
                    format!(".{}", ext)
                };
                if let Some(stem) = filename.strip_suffix(candidate.as_str()) {
                    return (stem.to_string(), candidate[1..].to_string());
                }
            }
        }
    }

    (filename.to_string(), String::new())
}

/// Decode the on-disk separator token into the logical title.
pub fn decode_title(raw: &str) -> String {
    raw.replace(SEPARATOR_TOKEN, "/")
}

/// Re-encode a logical title for use as a filesystem name.
pub fn encode_title(title: &str) -> String {
    title.replace('/', SEPARATOR_TOKEN)
}

/// Expected on-disk filename for a classified document.
///
/// The extension dot is only joined when the type is non-empty, so
/// unclassified files round-trip to their original names.
pub fn file_name_for(title: &str, file_type: &str) -> String {
    if file_type.is_empty() {
        encode_title(title)
    } else {
        format!("{}.{}", encode_title(title), file_type)
    }
}
