//! Extraction of filter properties from an exported mail-filter feed.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use std::fmt;

const ATOM_NS: &[u8] = b"http://www.w3.org/2005/Atom";
const APPS_NS: &[u8] = b"http://schemas.google.com/apps/2006";

/// The feed document is not well-formed XML.
#[derive(Debug)]
pub struct MalformedFeed(String);

impl fmt::Display for MalformedFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed feed document: {}", self.0)
    }
}

impl std::error::Error for MalformedFeed {}

fn malformed<E: fmt::Display>(e: E) -> MalformedFeed {
    MalformedFeed(e.to_string())
}

/// Recognized property names within a feed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyName {
    From,
    Label,
}

/// One recognized (name, value) observation inside a feed entry.
/// The value is kept as emitted, including when it is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProperty {
    pub name: PropertyName,
    pub value: String,
}

/// All properties of one feed entry, in document order.
pub type EntryProperties = Vec<RawProperty>;

/// Parses a filter feed into per-entry property groups.
///
/// The feed is an Atom-style document: entry elements in the Atom namespace,
/// each carrying property elements in the vendor extension namespace with
/// `name` and `value` attributes. Only `name="from"` and `name="label"` are
/// interpreted; any other element, namespace, or property name is skipped,
/// since export tools add fields this importer does not act on. A property
/// element missing its `name` or `value` attribute is likewise skipped, not
/// an error.
///
/// Groups are returned in document order, with properties in document order
/// within each group; a group's position is its entry index. Only an
/// ill-formed document fails, and then no partial result is produced.
pub fn parse_feed(document: &str) -> Result<Vec<EntryProperties>, MalformedFeed> {
    let mut reader = NsReader::from_str(document);

    let mut groups = Vec::new();
    let mut current: Option<EntryProperties> = None;
    // Open elements below the current entry, so we know which end tag
    // closes the entry itself.
    let mut depth = 0usize;
    // All open elements, so a truncated document is rejected at EOF.
    let mut open_elements = 0usize;

    loop {
        match reader.read_resolved_event().map_err(malformed)? {
            (ns, Event::Start(e)) => {
                open_elements += 1;
                if let Some(group) = current.as_mut() {
                    if let Some(prop) = vendor_property(&ns, &e)? {
                        group.push(prop);
                    }
                    depth += 1;
                } else if is_atom_entry(&ns, &e) {
                    current = Some(Vec::new());
                    depth = 0;
                }
            }
            (ns, Event::Empty(e)) => {
                if let Some(group) = current.as_mut() {
                    if let Some(prop) = vendor_property(&ns, &e)? {
                        group.push(prop);
                    }
                }
            }
            (_, Event::End(_)) => {
                open_elements = open_elements.saturating_sub(1);
                if depth > 0 {
                    depth -= 1;
                } else if let Some(group) = current.take() {
                    groups.push(group);
                }
            }
            (_, Event::Eof) => {
                if open_elements > 0 {
                    return Err(MalformedFeed("unexpected end of document".to_string()));
                }
                break;
            }
            _ => {}
        }
    }

    Ok(groups)
}

fn is_atom_entry(ns: &ResolveResult, e: &BytesStart) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(n)) if *n == ATOM_NS)
        && e.local_name().as_ref() == b"entry"
}

/// Returns the property carried by a vendor property element, or `None` for
/// anything that is not a complete, recognized property.
fn vendor_property(
    ns: &ResolveResult,
    e: &BytesStart,
) -> Result<Option<RawProperty>, MalformedFeed> {
    if !matches!(ns, ResolveResult::Bound(Namespace(n)) if *n == APPS_NS)
        || e.local_name().as_ref() != b"property"
    {
        return Ok(None);
    }
    let name = match attribute(e, "name")? {
        Some(name) => name,
        None => return Ok(None),
    };
    let name = match name.as_str() {
        "from" => PropertyName::From,
        "label" => PropertyName::Label,
        _ => return Ok(None),
    };
    let value = match attribute(e, "value")? {
        Some(value) => value,
        None => return Ok(None),
    };
    Ok(Some(RawProperty { name, value }))
}

fn attribute(e: &BytesStart, name: &str) -> Result<Option<String>, MalformedFeed> {
    match e.try_get_attribute(name).map_err(malformed)? {
        Some(attr) => Ok(Some(attr.unescape_value().map_err(malformed)?.into_owned())),
        None => Ok(None),
    }
}
