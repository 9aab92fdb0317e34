use thiserror::Error;

/// Largest accepted photo, inclusive.
pub const MAX_PHOTO_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhotoRejection {
    #[error("Please select an image file (PNG, JPG, etc.), got '{0}'")]
    InvalidType(String),

    #[error("Image size must be at most 5MB (got {size} bytes)")]
    TooLarge { size: u64, max: u64 },
}

/// Checks a photo's declared content type and byte size.
///
/// Any `image/*` type passes; the comparison ignores ASCII case since MIME
/// types are case-insensitive. The type is checked first, so a non-image is
/// reported as such whatever its size.
pub fn validate_photo(content_type: &str, size: u64) -> Result<(), PhotoRejection> {
    if !is_image_type(content_type) {
        return Err(PhotoRejection::InvalidType(content_type.to_string()));
    }
    if size > MAX_PHOTO_BYTES {
        return Err(PhotoRejection::TooLarge {
            size,
            max: MAX_PHOTO_BYTES,
        });
    }
    Ok(())
}

fn is_image_type(content_type: &str) -> bool {
    let essence = content_type.trim();
    essence
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
        && essence.len() > 6
}
