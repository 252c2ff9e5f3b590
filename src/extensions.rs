/**
 * Extension catalog: logical category names to the literal file
 * extensions they match
 */

use crate::error::OrganizeError;

/// Sidecar extensions looked up next to every transferred picture.
pub const SIDECAR_EXTENSIONS: &[&str] = &["xmp", "XMP"];

/// Category used when no `--extension` is given.
pub const DEFAULT_CATEGORY: &str = "jpg";

const RAW_FORMATS: &[&str] = &["srw", "cr2", "cr3", "nef", "arw", "orf", "raf", "rw2", "pef", "dng"];

const IMAGE_CATEGORIES: &[(&str, &[&str])] = &[
    ("jpg", &["jpg", "JPG", "jpeg", "JPEG"]),
    ("png", &["png", "PNG"]),
    ("tif", &["tif", "TIF", "tiff", "TIFF"]),
    ("heic", &["heic", "HEIC", "heif", "HEIF"]),
];

/// Expand category names into the ordered, deduplicated list of
/// extensions they cover.
///
/// Names are matched case-insensitively; the returned extensions are
/// literal (both case variants are listed in the catalog).
pub fn resolve<S: AsRef<str>>(categories: &[S]) -> Result<Vec<String>, OrganizeError> {
    let mut extensions: Vec<String> = Vec::new();
    let mut seen_any = false;

    for category in categories {
        let name = category.as_ref().trim().to_lowercase();
        if name.is_empty() {
            continue;
        }
        seen_any = true;

        for ext in category_extensions(&name)? {
            if !extensions.contains(&ext) {
                extensions.push(ext);
            }
        }
    }

    if !seen_any {
        return Err(OrganizeError::NoExtensions);
    }

    Ok(extensions)
}

/// Split a comma-separated `--extension` value into category names.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn category_extensions(name: &str) -> Result<Vec<String>, OrganizeError> {
    if let Some((_, exts)) = IMAGE_CATEGORIES.iter().find(|(n, _)| *n == name) {
        return Ok(exts.iter().map(|e| e.to_string()).collect());
    }

    if name == "raw" {
        return Ok(RAW_FORMATS.iter().flat_map(|f| case_variants(f)).collect());
    }

    if RAW_FORMATS.contains(&name) {
        return Ok(case_variants(name));
    }

    Err(OrganizeError::UnsupportedExtension(name.to_string()))
}

fn case_variants(ext: &str) -> Vec<String> {
    vec![ext.to_lowercase(), ext.to_uppercase()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_jpg_with_case_variants() {
        let exts = resolve(&["jpg"]).expect("jpg is known");
        assert_eq!(exts, vec!["jpg", "JPG", "jpeg", "JPEG"]);
    }

    #[test]
    fn category_names_are_case_insensitive() {
        let exts = resolve(&["PNG"]).expect("png is known");
        assert_eq!(exts, vec!["png", "PNG"]);
    }

    #[test]
    fn raw_covers_every_specific_format() {
        let raw = resolve(&["raw"]).expect("raw is known");
        for fmt in RAW_FORMATS {
            let specific = resolve(&[*fmt]).expect("specific raw format is known");
            for ext in specific {
                assert!(raw.contains(&ext), "raw is missing {ext}");
            }
        }
    }

    #[test]
    fn duplicates_across_categories_appear_once() {
        let exts = resolve(&["raw", "srw", "jpg"]).expect("known categories");
        assert_eq!(exts.iter().filter(|e| *e == "srw").count(), 1);
        assert_eq!(exts.iter().filter(|e| *e == "SRW").count(), 1);
        assert_eq!(exts.last().map(String::as_str), Some("JPEG"));
    }

    #[test]
    fn unknown_category_fails() {
        let err = resolve(&["jpg", "bmp"]).expect_err("bmp is unknown");
        assert!(matches!(err, OrganizeError::UnsupportedExtension(name) if name == "bmp"));
    }

    #[test]
    fn empty_request_fails() {
        let err = resolve(&parse_list(" , ")).expect_err("nothing requested");
        assert!(matches!(err, OrganizeError::NoExtensions));
    }

    #[test]
    fn parse_list_trims_and_drops_empty_entries() {
        assert_eq!(parse_list("jpg, raw,,png "), vec!["jpg", "raw", "png"]);
    }

    #[test]
    fn sidecars_are_not_a_category() {
        assert!(resolve(&["xmp"]).is_err());
        assert_eq!(SIDECAR_EXTENSIONS, &["xmp", "XMP"]);
    }
}
