//! Section codec — decodes the flat document into named sections and
//! encodes sections back into the canonical layout.
//!
//! A document looks like:
//!
//! ```text
//! ## WRITE:general
//! text to post
//!
//! ## READ:general
//! [2023-11-14 22:13:20] @Alice: hello
//!
//! ## MENTIONS
//! ```
//!
//! Decoding is tolerant: anything that is not a header is body text of the
//! currently open section, and text before the first header is dropped.

use std::collections::BTreeMap;
use std::fmt;

use crate::registry::ChannelRegistry;

/// Header keywords. Matching is case-sensitive.
const KEYWORDS: &[&str] = &["WRITE", "READ", "MENTIONS"];

const HEADER_PREFIX: &str = "## ";

/// Key addressing one section of the document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SectionKey(String);

impl SectionKey {
    /// Outbound staging section for a channel.
    pub fn write(channel_name: &str) -> Self {
        Self(format!("write:{channel_name}"))
    }

    /// Inbound log section for a channel.
    pub fn read(channel_name: &str) -> Self {
        Self(format!("read:{channel_name}"))
    }

    /// Global mentions log.
    pub fn mentions() -> Self {
        Self("mentions".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decoded document: section key to trimmed body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionMap {
    sections: BTreeMap<SectionKey, String>,
}

impl SectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Body of a section, if present.
    pub fn get(&self, key: &SectionKey) -> Option<&str> {
        self.sections.get(key).map(String::as_str)
    }

    /// Body of a section, or empty when absent.
    pub fn body(&self, key: &SectionKey) -> &str {
        self.get(key).unwrap_or("")
    }

    pub fn insert(&mut self, key: SectionKey, body: impl Into<String>) {
        self.sections.insert(key, body.into());
    }

    /// Append a line, separated by a single newline when the section already
    /// has content.
    pub fn append_line(&mut self, key: SectionKey, line: &str) {
        let body = self.sections.entry(key).or_default();
        if !body.is_empty() {
            body.push('\n');
        }
        body.push_str(line);
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SectionKey, &str)> {
        self.sections.iter().map(|(k, v)| (k, v.as_str()))
    }
}

/// Parse a header line into its section key.
///
/// Accepts `## TYPE` and `## TYPE:NAME` with a non-empty NAME.
fn parse_header(line: &str) -> Option<SectionKey> {
    let rest = line.strip_prefix(HEADER_PREFIX)?;
    let (keyword, name) = match rest.split_once(':') {
        Some((keyword, name)) => (keyword, Some(name)),
        None => (rest, None),
    };
    if !KEYWORDS.contains(&keyword) {
        return None;
    }
    let kind = keyword.to_lowercase();
    match name {
        None => Some(SectionKey(kind)),
        Some("") => None,
        Some(name) => Some(SectionKey(format!("{kind}:{name}"))),
    }
}

/// Decode a raw document. Never fails.
pub fn decode(content: &str) -> SectionMap {
    let mut raw: BTreeMap<SectionKey, String> = BTreeMap::new();
    let mut current: Option<SectionKey> = None;

    for line in content.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if let Some(key) = parse_header(line) {
            raw.entry(key.clone()).or_default();
            current = Some(key);
            continue;
        }

        if let Some(key) = &current
            && let Some(body) = raw.get_mut(key)
        {
            body.push_str(line);
            body.push('\n');
        }
    }

    let sections = raw
        .into_iter()
        .map(|(key, body)| (key, body.trim().to_string()))
        .collect();
    SectionMap { sections }
}

/// Encode sections into the canonical layout for `registry`.
///
/// Sections that the layout does not address are dropped.
pub fn encode(registry: &ChannelRegistry, sections: &SectionMap) -> String {
    let mut out = String::new();

    for channel in registry.iter() {
        let write = sections.body(&SectionKey::write(&channel.name));
        let read = sections.body(&SectionKey::read(&channel.name));
        out.push_str(&format!("## WRITE:{}\n{}\n\n", channel.name, write));
        out.push_str(&format!("## READ:{}\n{}\n\n", channel.name, read));
    }

    out.push_str(&format!(
        "## MENTIONS\n{}\n",
        sections.body(&SectionKey::mentions())
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Channel;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn registry() -> ChannelRegistry {
        ChannelRegistry::new(vec![
            Channel::new("C1", "general"),
            Channel::new("C2", "random"),
        ])
        .unwrap()
    }

    #[test]
    fn encode_empty_single_channel_layout() {
        let registry = ChannelRegistry::new(vec![Channel::new("C1", "general")]).unwrap();
        assert_eq!(
            encode(&registry, &SectionMap::new()),
            "## WRITE:general\n\n\n## READ:general\n\n\n## MENTIONS\n\n"
        );
    }

    #[test]
    fn decode_reads_sections_and_trims() {
        let doc = "## WRITE:general\n\n  hello\nworld  \n\n## READ:general\nline\n## MENTIONS\n";
        let map = decode(doc);
        assert_eq!(map.get(&SectionKey::write("general")), Some("hello\nworld"));
        assert_eq!(map.get(&SectionKey::read("general")), Some("line"));
        assert_eq!(map.get(&SectionKey::mentions()), Some(""));
    }

    #[test]
    fn decode_keeps_inner_blank_lines() {
        let map = decode("## WRITE:general\na\n\n\nb\n");
        assert_eq!(map.body(&SectionKey::write("general")), "a\n\n\nb");
    }

    #[test]
    fn decode_discards_preamble() {
        let map = decode("stray\ntext\n## READ:general\nkept");
        assert_eq!(map.len(), 1);
        assert_eq!(map.body(&SectionKey::read("general")), "kept");
    }

    #[test]
    fn decode_without_headers_is_empty() {
        assert!(decode("").is_empty());
        assert!(decode("just some notes\n## Todo\n").is_empty());
    }

    #[test]
    fn unknown_headers_are_body_lines() {
        let map = decode("## WRITE:general\nhi\n## Notes\n## write:other\nmore");
        assert_eq!(
            map.body(&SectionKey::write("general")),
            "hi\n## Notes\n## write:other\nmore"
        );
    }

    #[test]
    fn header_with_empty_name_is_body_line() {
        let map = decode("## READ:general\na\n## WRITE:\nb");
        assert_eq!(map.body(&SectionKey::read("general")), "a\n## WRITE:\nb");
    }

    #[test]
    fn bare_keyword_headers_decode_to_bare_keys() {
        let map = decode("## WRITE\nx\n## READ\ny\n## MENTIONS\nz");
        assert_eq!(map.get(&SectionKey("write".into())), Some("x"));
        assert_eq!(map.get(&SectionKey("read".into())), Some("y"));
        assert_eq!(map.get(&SectionKey::mentions()), Some("z"));
    }

    #[test]
    fn repeated_header_accumulates() {
        let map = decode("## READ:general\none\n## MENTIONS\nm\n## READ:general\ntwo");
        assert_eq!(map.body(&SectionKey::read("general")), "one\ntwo");
    }

    #[test]
    fn crlf_documents_decode_like_lf() {
        let map = decode("## WRITE:general\r\nhi\r\n\r\n## MENTIONS\r\n");
        assert_eq!(map.body(&SectionKey::write("general")), "hi");
        assert_eq!(map.get(&SectionKey::mentions()), Some(""));
    }

    #[test]
    fn encode_normalizes_order_and_drops_strays() {
        let doc = "## MENTIONS\nm\n## READ:random\nr\nnoise\n## WRITE:general\nw\n## WRITE:ghost\ng";
        let encoded = encode(&registry(), &decode(doc));
        assert_eq!(
            encoded,
            "## WRITE:general\nw\n\n## READ:general\n\n\n\
             ## WRITE:random\n\n\n## READ:random\nr\nnoise\n\n\
             ## MENTIONS\nm\n"
        );
    }

    #[test]
    fn decode_encode_is_stable() {
        let mut map = SectionMap::new();
        map.insert(SectionKey::write("general"), "post this\n\nplease");
        map.insert(SectionKey::read("general"), "[x] @a: 1\n[y] @b: 2");
        map.insert(SectionKey::read("random"), "r");
        map.insert(SectionKey::mentions(), "[z] #general: @a: hey");

        let once = decode(&encode(&registry(), &map));
        for (key, body) in map.iter() {
            assert_eq!(once.body(key), body, "section {key}");
        }

        let twice = decode(&encode(&registry(), &once));
        assert_eq!(once, twice);
    }

    /// Body lines for generated maps. None of them is a header, even after
    /// trimming.
    const BODY_LINES: &[&str] = &[
        "",
        "   ",
        "hello",
        "  indented",
        "trailing  ",
        "[2023-11-14 22:13:20] @Alice: hi",
        "- item",
        "## Agenda",
        "## write:general",
        "## WRITE:",
        "##WRITE:general",
        "caf\u{e9} \u{2615}",
        "tab\there",
        "<@U1> ping",
    ];

    fn random_body(rng: &mut StdRng) -> String {
        let count = rng.gen_range(0..6);
        let lines: Vec<&str> = (0..count)
            .map(|_| BODY_LINES[rng.gen_range(0..BODY_LINES.len())])
            .collect();
        lines.join("\n").trim().to_string()
    }

    #[test]
    fn decode_encode_is_stable_for_generated_maps() {
        let registry = registry();
        let keys = [
            SectionKey::write("general"),
            SectionKey::read("general"),
            SectionKey::write("random"),
            SectionKey::read("random"),
            SectionKey::mentions(),
        ];
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..500 {
            let mut map = SectionMap::new();
            for key in &keys {
                if rng.gen_bool(0.7) {
                    map.insert(key.clone(), random_body(&mut rng));
                }
            }

            let once = decode(&encode(&registry, &map));
            for key in &keys {
                assert_eq!(once.body(key), map.body(key), "section {key} of {map:?}");
            }
            let twice = decode(&encode(&registry, &once));
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn append_line_joins_with_single_newline() {
        let mut map = SectionMap::new();
        let key = SectionKey::mentions();
        map.append_line(key.clone(), "a");
        map.append_line(key.clone(), "b");
        assert_eq!(map.body(&key), "a\nb");
    }
}
