//! Functions for turning display names into ASCII-safe, lowercase filenames.

use std::borrow::Cow;
use unicode_general_category::{get_general_category, GeneralCategory};
use unicode_normalization::UnicodeNormalization;

/// Returns if a character is a nonspacing mark, like an accent over a letter.
fn is_nonspacing_mark(c: char) -> bool {
    get_general_category(c) == GeneralCategory::NonspacingMark
}

/// Returns if a name is already in normalized form, so normalizing it changes nothing.
fn is_normalized(name: &str) -> bool {
    name.bytes()
        .all(|b| b.is_ascii() && b != b' ' && b != b'-' && !b.is_ascii_uppercase())
}

/// Remove accents from a piece of text.
///
/// The text is decomposed into base characters and combining marks, and the nonspacing
/// marks are dropped. Spacing and enclosing marks are kept, as are characters without a
/// decomposition.
///
/// # Examples
///
/// ```rust
/// # use namecopy::filename::remove_accents;
/// assert_eq!("Andras", remove_accents("András"));
/// assert_eq!("本", remove_accents("本"));
/// ```
pub fn remove_accents(text: &str) -> Cow<str> {
    if text.is_ascii() {
        return text.into();
    }
    text.nfd()
        .filter(|c| !is_nonspacing_mark(*c))
        .collect::<String>()
        .into()
}

/// Convert a display name to an ASCII-safe filename fragment.
///
/// Accents are removed, spaces and hyphens become underscores, and the result is
/// lowercased. Scripts without a canonical decomposition (e.g. ideographs) are kept, so
/// the result is only guaranteed to be ASCII for accented Latin text.
///
/// # Examples
///
/// ```rust
/// # use namecopy::filename::normalize;
/// assert_eq!("andras_barasits", normalize("András Barasits"));
/// assert_eq!("donat_bali_papp", normalize("Donát Bali-papp"));
/// assert_eq!("", normalize(""));
/// ```
pub fn normalize(name: &str) -> Cow<str> {
    if is_normalized(name) {
        return name.into();
    }
    remove_accents(name)
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c,
        })
        .collect::<String>()
        .to_lowercase()
        .into()
}

/// Get the target filename for a source file.
///
/// The stem is normalized and the extension is lowercased, with `jpeg` shortened to
/// `jpg`.
///
/// # Examples
///
/// ```rust
/// # use namecopy::filename::target_filename;
/// assert_eq!("andras_barasits.jpg", target_filename("András_Barasits.jpeg"));
/// ```
pub fn target_filename(original: &str) -> String {
    match original.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_lowercase();
            let ext = if ext == "jpeg" { "jpg" } else { &ext };
            format!("{}.{}", normalize(stem), ext)
        }
        _ => normalize(original).into_owned(),
    }
}
