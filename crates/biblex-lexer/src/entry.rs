//! Entry-type vocabulary and the record shape a parser builds from tokens.
//!
//! Nothing in here is used by the scanner itself. A record assembler walks
//! the token stream from one `EntryOpenDelim` to its `EntryStopDelim` and
//! fills in an [`Entry`].

use std::fmt;
use std::str::FromStr;

/// Entry types a consumer accepts.
pub const ENTRY_TYPES: &[&str] = &["article", "book", "misc", "proceedings", "inproceedings"];

/// Check if an entry type name is in the recognized vocabulary.
pub fn is_entry_type(name: &str) -> bool {
    ENTRY_TYPES.iter().any(|t| t.eq_ignore_ascii_case(name))
}

/// A recognized bibliography entry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryType {
    Article,
    Book,
    Misc,
    Proceedings,
    Inproceedings,
}

impl EntryType {
    /// The lowercase name as written in `@type{`.
    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Article => "article",
            EntryType::Book => "book",
            EntryType::Misc => "misc",
            EntryType::Proceedings => "proceedings",
            EntryType::Inproceedings => "inproceedings",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown entry type '{0}'")]
pub struct UnknownEntryType(pub String);

impl FromStr for EntryType {
    type Err = UnknownEntryType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "article" => Ok(EntryType::Article),
            "book" => Ok(EntryType::Book),
            "misc" => Ok(EntryType::Misc),
            "proceedings" => Ok(EntryType::Proceedings),
            "inproceedings" => Ok(EntryType::Inproceedings),
            _ => Err(UnknownEntryType(s.to_string())),
        }
    }
}

/// One piece of a field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text from a braced or quoted value, verbatim.
    Literal(String),
    /// A bare name to resolve against `@string` definitions.
    Macro(String),
}

/// A field value: one segment, or several joined by `#`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValueExpr(pub Vec<Segment>);

impl ValueExpr {
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_concatenation(&self) -> bool {
        self.0.len() > 1
    }

    pub fn ends_with_macro(&self) -> bool {
        matches!(self.0.last(), Some(Segment::Macro(_)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: ValueExpr,
}

/// A bibliography record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub entry_type: EntryType,
    pub cite_key: String,
    pub fields: Vec<Field>,
}

impl Entry {
    /// Look up a field by name. Tag names compare case-insensitively.
    pub fn field(&self, name: &str) -> Option<&ValueExpr> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| &f.value)
    }
}
