use crate::classify::classify;
use crate::{ImageRecord, SymbolEntry, TextMatch, UNKNOWN_SENTINEL};

/// An image paired with its file name and manifest record.
#[derive(Debug, Clone)]
pub struct CorrelatedAsset {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub entry: SymbolEntry,
}

/// Make a label safe for use in a file name.
///
/// Trims surrounding whitespace, then replaces `/` and `:` with `-` and
/// spaces with `_`. Slash and colon replacements are one-way.
pub fn sanitize(text: &str) -> String {
    text.trim().replace('/', "-").replace(' ', "_").replace(':', "-")
}

/// Turn a label back into manifest text: underscores become spaces, then trim.
pub fn humanize(text: &str) -> String {
    text.replace('_', " ").trim().to_string()
}

/// Pair a page's images with its text matches by position.
///
/// Image `i` (its 1-based [`ImageRecord::index`]) takes text match `i - 1`.
/// Images past the end of the match list become sentinel entries named
/// `page{N}_img{i}.{ext}`; extra matches are ignored. `page` is 0-based.
pub fn correlate_page(
    page: usize,
    images: Vec<ImageRecord>,
    matches: &[TextMatch],
    asset_prefix: &str,
) -> Vec<CorrelatedAsset> {
    images
        .into_iter()
        .map(|image| {
            let position = image.index;
            let slot = position.checked_sub(1).and_then(|i| matches.get(i));
            let (file_name, reference, name, column, kind) = match slot {
                Some(m) => {
                    let class = classify(&m.reference);
                    let column = class.column.label();
                    let file_name = format!(
                        "{} - {} - {} - {}.{}",
                        sanitize(column),
                        sanitize(class.subtype),
                        m.reference,
                        sanitize(&m.name),
                        image.ext
                    );
                    (
                        file_name,
                        m.reference.clone(),
                        m.name.clone(),
                        column.to_string(),
                        class.subtype.to_string(),
                    )
                }
                None => {
                    let file_name = format!("page{}_img{}.{}", page + 1, position, image.ext);
                    tracing::warn!(
                        page = page + 1,
                        image = position,
                        "no text match for image, writing sentinel entry"
                    );
                    (
                        file_name.clone(),
                        UNKNOWN_SENTINEL.to_string(),
                        file_name,
                        UNKNOWN_SENTINEL.to_string(),
                        String::new(),
                    )
                }
            };

            tracing::debug!(page = page + 1, image = position, file = %file_name, "correlated");

            let entry = SymbolEntry {
                reference,
                name: humanize(&name),
                column: humanize(&column),
                kind: humanize(&kind),
                image: format!("{}/{}", asset_prefix.trim_end_matches('/'), file_name),
                description: String::new(),
            };

            CorrelatedAsset {
                file_name,
                bytes: image.bytes,
                entry,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_ASSET_PREFIX;

    fn images(n: usize, ext: &str) -> Vec<ImageRecord> {
        (1..=n)
            .map(|index| ImageRecord {
                bytes: vec![index as u8; 4],
                ext: ext.to_string(),
                index,
            })
            .collect()
    }

    #[test]
    fn pairs_images_with_matches_by_position() {
        let matches = [TextMatch::new("3.4", "Lake"), TextMatch::new("3.5", "Stream")];
        let assets = correlate_page(0, images(2, "png"), &matches, DEFAULT_ASSET_PREFIX);

        assert_eq!(assets.len(), 2);
        assert!(
            assets[0]
                .file_name
                .starts_with("Column_D - Water_Features - 3.4 - Lake.")
        );
        assert_eq!(assets[1].file_name, "Column_D - Water_Features - 3.5 - Stream.png");
        assert_eq!(assets[0].bytes, vec![1; 4]);

        let entry = &assets[0].entry;
        assert_eq!(entry.reference, "3.4");
        assert_eq!(entry.name, "Lake");
        assert_eq!(entry.column, "Column D");
        assert_eq!(entry.kind, "Water Features");
        assert_eq!(
            entry.image,
            "./assets/Column_D - Water_Features - 3.4 - Lake.png"
        );
        assert_eq!(entry.description, "");
    }

    #[test]
    fn surplus_images_become_sentinels() {
        let matches = [TextMatch::new("8.1", "Low")];
        let assets = correlate_page(4, images(3, "jpeg"), &matches, DEFAULT_ASSET_PREFIX);

        assert_eq!(assets[0].file_name, "Column_E - Appearance - 8.1 - Low.jpeg");
        assert_eq!(assets[1].file_name, "page5_img2.jpeg");
        assert_eq!(assets[2].file_name, "page5_img3.jpeg");

        let sentinel = &assets[1].entry;
        assert_eq!(sentinel.reference, "unknown");
        assert_eq!(sentinel.column, "unknown");
        assert_eq!(sentinel.kind, "");
        assert_eq!(sentinel.name, "page5 img2.jpeg");
        assert_eq!(sentinel.image, "./assets/page5_img2.jpeg");
        assert!(sentinel.is_sentinel());
    }

    #[test]
    fn surplus_matches_are_ignored() {
        let matches = [
            TextMatch::new("0.1", "Southern"),
            TextMatch::new("0.2", "Northern"),
        ];
        let assets = correlate_page(0, images(1, "png"), &matches, DEFAULT_ASSET_PREFIX);
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].entry.reference, "0.1");
    }

    #[test]
    fn pairing_follows_the_record_index() {
        let matches = [TextMatch::new("3.4", "Lake"), TextMatch::new("3.5", "Stream")];
        let records = vec![
            ImageRecord {
                bytes: vec![2],
                ext: "png".into(),
                index: 2,
            },
            ImageRecord {
                bytes: vec![5],
                ext: "png".into(),
                index: 5,
            },
        ];
        let assets = correlate_page(0, records, &matches, DEFAULT_ASSET_PREFIX);

        assert_eq!(assets[0].entry.reference, "3.5");
        assert_eq!(assets[0].bytes, vec![2]);
        assert_eq!(assets[1].file_name, "page1_img5.png");
        assert!(assets[1].entry.is_sentinel());
    }

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize("A/B C:D"), "A-B_C-D");
        assert_eq!(sanitize("  Prominent / Special  "), "Prominent_-_Special");
    }

    #[test]
    fn manifest_fields_keep_natural_spacing() {
        let matches = [TextMatch::new("6.1", "A/B C:D ")];
        let assets = correlate_page(0, images(1, "png"), &matches, DEFAULT_ASSET_PREFIX);
        assert_eq!(
            assets[0].file_name,
            "Column_D - Prominent_-_Special - 6.1 - A-B_C-D.png"
        );
        assert_eq!(assets[0].entry.name, "A/B C:D");
        assert_eq!(assets[0].entry.kind, "Prominent / Special");
        assert_eq!(humanize(&sanitize("A B")), "A B");
    }

    #[test]
    fn unknown_reference_still_gets_a_named_file() {
        let matches = [TextMatch::new("14.2", "Beyond")];
        let assets = correlate_page(0, images(1, "png"), &matches, DEFAULT_ASSET_PREFIX);
        assert_eq!(assets[0].file_name, "Unknown -  - 14.2 - Beyond.png");
        assert_eq!(assets[0].entry.column, "Unknown");
    }

    #[test]
    fn custom_prefix_is_used_for_image_field() {
        let matches = [TextMatch::new("12.1", "Centre")];
        let assets = correlate_page(0, images(1, "png"), &matches, "static/img/");
        assert_eq!(
            assets[0].entry.image,
            "static/img/Column_G - Location - 12.1 - Centre.png"
        );
    }

    #[test]
    fn identical_input_gives_identical_output() {
        let matches = [TextMatch::new("2.1", "Cliff")];
        let a = correlate_page(1, images(2, "png"), &matches, DEFAULT_ASSET_PREFIX);
        let b = correlate_page(1, images(2, "png"), &matches, DEFAULT_ASSET_PREFIX);
        let names_a: Vec<_> = a.iter().map(|x| (&x.file_name, &x.entry)).collect();
        let names_b: Vec<_> = b.iter().map(|x| (&x.file_name, &x.entry)).collect();
        assert_eq!(names_a, names_b);
    }
}
