//! Markdown panels that accompany the charts.

use std::fmt::Write;

use crate::model::{Metadata, Timeline};

/// Paragraph separator used inside comment cells.
const PARAGRAPH_BREAK: &str = "<br>";

/// The comment column as a markdown narrative, one entry per record.
/// Blank paragraphs are dropped:
///
/// ```text
/// **T+10:15 : ** *first paragraph*
///
/// *second paragraph*
///
///  ---
/// ```
pub fn narrative_markdown(timeline: &Timeline) -> String {
    let mut out = String::with_capacity(timeline.len() * 64);
    for record in timeline.records() {
        let _ = write!(out, "**T+{} : ** ", record.time.format("%H:%M"));
        let mut paragraphs = record
            .comment
            .split(PARAGRAPH_BREAK)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .peekable();
        if paragraphs.peek().is_none() {
            out.push_str("\n\n");
        }
        for paragraph in paragraphs {
            let _ = write!(out, "*{paragraph}* \n\n");
        }
        out.push_str(" --- \n");
    }
    out
}

/// The metadata row as `**Label** : value` lines, labels capitalized.
pub fn metadata_markdown(metadata: &Metadata) -> String {
    let mut out = String::new();
    for (label, value) in metadata.entries() {
        let _ = write!(out, "**{}** : {}\n\n", capitalize(label.trim()), value);
    }
    out
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::RawTable;
    use crate::parsers::timeline::parse_timeline;

    #[test]
    fn narrative_splits_paragraphs() {
        let table = RawTable::new(
            vec!["time".into(), "dose".into(), "comment".into(), "anxiety".into()],
            vec![
                vec!["9:05".into(), "0".into(), "calm<br>a bit cold".into(), "1".into()],
                vec!["10:15".into(), "0".into(), "".into(), "1".into()],
            ],
        );
        let timeline = parse_timeline(&table).unwrap();
        assert_eq!(
            narrative_markdown(&timeline),
            "**T+09:05 : ** *calm* \n\n*a bit cold* \n\n --- \n**T+10:15 : ** \n\n --- \n"
        );
    }

    #[test]
    fn metadata_labels_are_capitalized() {
        let metadata = Metadata::new(vec![
            ("age".into(), "27".into()),
            ("Weight".into(), "70kg".into()),
            ("été".into(), "yes".into()),
        ]);
        assert_eq!(
            metadata_markdown(&metadata),
            "**Age** : 27\n\n**Weight** : 70kg\n\n**Été** : yes\n\n"
        );
    }

    #[test]
    fn empty_metadata_renders_nothing() {
        assert_eq!(metadata_markdown(&Metadata::default()), "");
    }
}
