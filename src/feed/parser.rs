use chrono::{DateTime, Utc};
use feed_rs::model::{Entry, Link};
use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    /// Neither the document nor its repaired form could be parsed
    #[error("Unparseable feed: {0}")]
    Malformed(String),
}

/// One feed item before normalization.
///
/// Dates come from `feed-rs`'s lenient timestamp handling; a date present
/// in the document but unparseable shows up as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct ParsedFeed {
    /// At most `max_entries` items, in document order
    pub entries: Vec<RawEntry>,
    /// Entry count before the cap was applied
    pub total: usize,
    /// Strict-parse error when the entries came from the repaired document
    pub recovered_from: Option<String>,
}

/// Parses an RSS, Atom or JSON feed, keeping the first `max_entries` items.
///
/// A document that fails strict parsing gets one repair pass (see
/// [`repair_truncated`]); entries recovered that way are returned with
/// `recovered_from` set so the caller can warn about it.
pub fn parse_feed(bytes: &[u8], max_entries: usize) -> Result<ParsedFeed, ParseError> {
    let strict_err = match feed_rs::parser::parse(bytes) {
        Ok(feed) => return Ok(collect_entries(feed.entries, max_entries, None)),
        Err(e) => e.to_string(),
    };

    let text = String::from_utf8_lossy(bytes);
    let Some(repaired) = repair_truncated(&text) else {
        return Err(ParseError::Malformed(strict_err));
    };

    match feed_rs::parser::parse(repaired.as_bytes()) {
        Ok(feed) => Ok(collect_entries(feed.entries, max_entries, Some(strict_err))),
        Err(_) => Err(ParseError::Malformed(strict_err)),
    }
}

fn collect_entries(
    entries: Vec<Entry>,
    max_entries: usize,
    recovered_from: Option<String>,
) -> ParsedFeed {
    let total = entries.len();
    let entries = entries
        .into_iter()
        .take(max_entries)
        .map(raw_entry)
        .collect();

    ParsedFeed {
        entries,
        total,
        recovered_from,
    }
}

fn raw_entry(entry: Entry) -> RawEntry {
    RawEntry {
        title: entry.title.map(|t| t.content),
        link: preferred_link(&entry.links).map(|l| l.href.clone()),
        summary: entry.summary.map(|s| s.content),
        description: entry.content.and_then(|c| c.body),
        published: entry.published,
        updated: entry.updated,
    }
}

/// Atom entries may carry several links; the `alternate` one points at the post.
fn preferred_link(links: &[Link]) -> Option<&Link> {
    links
        .iter()
        .find(|l| l.rel.as_deref() == Some("alternate"))
        .or_else(|| links.first())
}

/// Cuts a truncated document after its last complete `<item>` or `<entry>`
/// and closes the elements still open at that point.
///
/// Returns `None` when the document holds no complete item, or when every
/// element was already closed and there is nothing to cut.
pub fn repair_truncated(text: &str) -> Option<String> {
    let mut reader = Reader::from_str(text);
    let mut open: Vec<String> = Vec::new();
    let mut last_item: Option<(usize, Vec<String>)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                open.push(String::from_utf8_lossy(e.name().as_ref()).into_owned());
            }
            Ok(Event::End(e)) => {
                open.pop();
                if matches!(e.local_name().as_ref(), b"item" | b"entry") {
                    let Ok(end) = usize::try_from(reader.buffer_position()) else {
                        break;
                    };
                    last_item = Some((end, open.clone()));
                }
            }
            Ok(Event::Eof) if open.is_empty() => return None,
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }

    let (end, still_open) = last_item?;
    let mut repaired = text.get(..end)?.to_owned();
    for name in still_open.iter().rev() {
        repaired.push_str("</");
        repaired.push_str(name);
        repaired.push('>');
    }
    Some(repaired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>T</title>
    <item><title> First </title><link>https://example.com/1</link>
        <description>Summary one</description>
        <pubDate>Tue, 05 Mar 2024 14:30:00 GMT</pubDate></item>
    <item><title>Second</title><link>https://example.com/2</link>
        <pubDate>sometime last week</pubDate></item>
</channel></rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom</title><id>urn:feed</id><updated>2024-03-05T00:00:00Z</updated>
  <entry>
    <title>Atom entry</title><id>urn:1</id>
    <link rel="self" href="https://example.com/self"/>
    <link rel="alternate" href="https://example.com/post"/>
    <updated>2024-03-04T10:00:00Z</updated>
    <content type="html">Body text</content>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss_fields() {
        let parsed = parse_feed(RSS.as_bytes(), 50).unwrap();
        assert_eq!(parsed.total, 2);
        assert!(parsed.recovered_from.is_none());

        let first = &parsed.entries[0];
        assert_eq!(first.title.as_deref().map(str::trim), Some("First"));
        assert_eq!(first.link.as_deref(), Some("https://example.com/1"));
        assert_eq!(first.summary.as_deref(), Some("Summary one"));
        assert_eq!(
            first.published,
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_unparseable_date_is_none() {
        let parsed = parse_feed(RSS.as_bytes(), 50).unwrap();
        assert_eq!(parsed.entries[1].published, None);
    }

    #[test]
    fn test_parse_atom_prefers_alternate_link() {
        let parsed = parse_feed(ATOM.as_bytes(), 50).unwrap();
        let entry = &parsed.entries[0];
        assert_eq!(entry.link.as_deref(), Some("https://example.com/post"));
        assert_eq!(entry.description.as_deref(), Some("Body text"));
        assert_eq!(
            entry.updated,
            Some(Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_entry_cap_keeps_feed_order() {
        let items: String = (0..60)
            .map(|i| format!("<item><title>Item {i}</title></item>"))
            .collect();
        let rss = format!(r#"<rss version="2.0"><channel><title>T</title>{items}</channel></rss>"#);

        let parsed = parse_feed(rss.as_bytes(), 50).unwrap();
        assert_eq!(parsed.total, 60);
        assert_eq!(parsed.entries.len(), 50);
        assert_eq!(parsed.entries[0].title.as_deref(), Some("Item 0"));
        assert_eq!(parsed.entries[49].title.as_deref(), Some("Item 49"));
    }

    #[test]
    fn test_bare_ampersand_still_yields_entries() {
        let rss = r#"<rss version="2.0"><channel><title>T</title>
<item><title>Fees & Rates</title><link>https://example.com/a</link></item>
</channel></rss>"#;
        let parsed = parse_feed(rss.as_bytes(), 50).unwrap();
        assert!(parsed.recovered_from.is_none());
        assert_eq!(parsed.entries.len(), 1);
        assert!(parsed.entries[0]
            .title
            .as_deref()
            .unwrap_or_default()
            .contains('&'));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            parse_feed(b"<not valid xml", 50),
            Err(ParseError::Malformed(_))
        ));
        assert!(matches!(
            parse_feed(b"plain text, no markup", 50),
            Err(ParseError::Malformed(_))
        ));
    }

    const TRUNCATED_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>T</title>
  <item><title>Kept</title><link>https://example.com/1</link></item>
  <item><title>Cut off mid"#;

    #[test]
    fn test_wrong_weekday_pub_date_still_parses() {
        // 4 March 2024 was a Monday
        let rss = r#"<rss version="2.0"><channel><title>T</title>
<item><title>A</title><pubDate>Tue, 04 Mar 2024 09:00:00 GMT</pubDate></item>
<item><title>B</title><pubDate>Mon, 04 Mar 2024 9:00:00 GMT</pubDate></item>
</channel></rss>"#;
        let parsed = parse_feed(rss.as_bytes(), 50).unwrap();
        let expected = Some(Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap());
        assert_eq!(parsed.entries[0].published, expected);
        assert_eq!(parsed.entries[1].published, expected);
    }

    #[test]
    fn test_truncated_rss_keeps_complete_items() {
        let parsed = parse_feed(TRUNCATED_RSS.as_bytes(), 50).unwrap();
        assert!(parsed.recovered_from.is_some());
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.entries[0].title.as_deref(), Some("Kept"));
    }

    #[test]
    fn test_feed_cut_after_last_item_is_recovered() {
        let rss = r#"<rss version="2.0"><channel><title>T</title><item><title>Only</title></item>"#;
        let parsed = parse_feed(rss.as_bytes(), 50).unwrap();
        assert!(parsed.recovered_from.is_some());
        assert_eq!(parsed.entries.len(), 1);
    }

    #[test]
    fn test_truncated_atom_keeps_complete_entries() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom</title><id>urn:feed</id>
  <entry><title>First</title><id>urn:1</id><link href="https://example.com/1"/></entry>
  <entry><title>Second</title><id>urn:2</id><link href="https://example.com/2"/></entry>
  <entry><title>Thi"#;
        let parsed = parse_feed(atom.as_bytes(), 50).unwrap();
        assert!(parsed.recovered_from.is_some());
        let titles: Vec<_> = parsed
            .entries
            .iter()
            .map(|e| e.title.as_deref().unwrap_or_default())
            .collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[test]
    fn test_repair_cuts_after_last_item_and_closes_parents() {
        let repaired = repair_truncated(TRUNCATED_RSS).unwrap();
        assert!(repaired.ends_with(
            "<item><title>Kept</title><link>https://example.com/1</link></item></channel></rss>"
        ));
    }

    #[test]
    fn test_repair_leaves_complete_or_itemless_documents() {
        assert_eq!(repair_truncated(RSS), None);
        assert_eq!(repair_truncated("<rss><channel><title>T</title>"), None);
        assert_eq!(repair_truncated("no markup"), None);
    }
}
