//! Upload filename helpers.

/// Extensions accepted for profile pictures.
const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Lowercased extension of `filename`, if it is an accepted image type.
pub fn image_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return None;
    }
    // Belt and braces: the extension must map to an image MIME type.
    let mime = mime_guess::from_ext(&ext).first()?;
    (mime.type_() == mime_guess::mime::IMAGE).then_some(ext)
}
