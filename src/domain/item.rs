use url::Url;

/// Opaque address of a remote image. Duplicates are allowed.
pub type Locator = String;

pub const DEFAULT_EXTENSION: &str = ".jpg";

const MAX_EXTENSION_LEN: usize = 8;

/// Bytes returned by a single successful fetch, before an index is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub extension: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedItem {
    pub index: usize,
    pub bytes: Vec<u8>,
    pub extension: String,
}

impl RetrievedItem {
    pub fn new(index: usize, image: FetchedImage) -> Self {
        Self {
            index,
            bytes: image.bytes,
            extension: image.extension,
        }
    }

    /// Name the item is staged under, e.g. `image_7.png`.
    pub fn file_name(&self) -> String {
        format!("image_{}{}", self.index, self.extension)
    }
}

/// Derive a file extension from the last path segment of a locator.
///
/// Query strings and fragments are ignored. The result always carries a
/// leading dot and is lowercased; anything unusable falls back to `.jpg`.
pub fn normalize_extension(locator: &str) -> String {
    let path = match Url::parse(locator) {
        Ok(url) => url.path().to_string(),
        Err(_) => locator
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    let segment = path.rsplit('/').next().unwrap_or_default();

    let suffix = match segment.rfind('.') {
        Some(pos) if pos > 0 => &segment[pos + 1..],
        _ => return DEFAULT_EXTENSION.to_string(),
    };

    let suffix = suffix.split('?').next().unwrap_or_default();

    if suffix.is_empty()
        || suffix.len() > MAX_EXTENSION_LEN
        || !suffix.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return DEFAULT_EXTENSION.to_string();
    }

    format!(".{}", suffix.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_extension() {
        assert_eq!(normalize_extension("https://example.com/cat.png"), ".png");
    }

    #[test]
    fn test_query_string_is_dropped() {
        assert_eq!(
            normalize_extension("https://example.com/img/cat.jpeg?w=640&h=480"),
            ".jpeg"
        );
    }

    #[test]
    fn test_fragment_is_dropped() {
        assert_eq!(normalize_extension("https://example.com/cat.gif#top"), ".gif");
    }

    #[test]
    fn test_missing_extension_defaults_to_jpg() {
        assert_eq!(normalize_extension("https://example.com/images/12345"), ".jpg");
        assert_eq!(normalize_extension("https://example.com/"), ".jpg");
    }

    #[test]
    fn test_dot_in_query_does_not_count() {
        assert_eq!(
            normalize_extension("https://example.com/photo?scale=1.5"),
            ".jpg"
        );
    }

    #[test]
    fn test_dot_in_directory_does_not_count() {
        assert_eq!(
            normalize_extension("https://cdn.example.com/v1.2/photo"),
            ".jpg"
        );
    }

    #[test]
    fn test_hidden_file_style_name_has_no_extension() {
        assert_eq!(normalize_extension("https://example.com/.png"), ".jpg");
    }

    #[test]
    fn test_extension_is_lowercased() {
        assert_eq!(normalize_extension("https://example.com/CAT.JPG"), ".jpg");
        assert_eq!(normalize_extension("https://example.com/a.WebP"), ".webp");
    }

    #[test]
    fn test_unparseable_locator_still_normalized() {
        assert_eq!(normalize_extension("not a url/pic.png?x=1"), ".png");
        assert_eq!(normalize_extension("no-extension-here"), ".jpg");
    }

    #[test]
    fn test_weird_suffix_falls_back() {
        assert_eq!(
            normalize_extension("https://example.com/a.php%20x"),
            ".jpg"
        );
        assert_eq!(
            normalize_extension("https://example.com/a.averyverylongsuffix"),
            ".jpg"
        );
    }

    #[test]
    fn test_file_name_uses_index() {
        let item = RetrievedItem::new(
            7,
            FetchedImage {
                bytes: vec![1, 2, 3],
                extension: ".png".into(),
            },
        );
        assert_eq!(item.file_name(), "image_7.png");
    }
}
