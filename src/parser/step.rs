use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::LoadError;

const MAGIC: &str = "ISO-10303-21";

/// Entity type given to complex instances like `#5=(IFCA()IFCB());`.
pub const COMPLEX_ENTITY: &str = "<COMPLEX>";

#[derive(Debug, Clone, PartialEq)]
pub enum StepValue {
    String(String),
    Real(f64),
    Integer(i64),
    Boolean(bool),
    Enum(String),
    Reference(u64),
    /// Typed value like `IFCLABEL('x')` or `IFCINTEGER(700)`.
    Typed(String, Box<StepValue>),
    List(Vec<StepValue>),
    Binary(String),
    Null,
    Derived,
}

impl StepValue {
    /// Shorthand for a typed string such as `IFCLABEL('text')`.
    #[must_use]
    pub fn typed_string(type_name: &str, text: impl Into<String>) -> Self {
        Self::Typed(type_name.to_string(), Box::new(Self::String(text.into())))
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Typed(_, inner) => inner.as_str(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_reference(&self) -> Option<u64> {
        match self {
            Self::Reference(id) => Some(*id),
            _ => None,
        }
    }

    /// References held directly in a list value.
    #[must_use]
    pub fn references(&self) -> Vec<u64> {
        match self {
            Self::List(items) => items.iter().filter_map(Self::as_reference).collect(),
            Self::Reference(id) => vec![*id],
            _ => Vec::new(),
        }
    }

    /// Visits every reference, including those nested in lists and typed values.
    pub fn for_each_reference(&self, f: &mut impl FnMut(u64)) {
        match self {
            Self::Reference(id) => f(*id),
            Self::List(items) => items.iter().for_each(|item| item.for_each_reference(f)),
            Self::Typed(_, inner) => inner.for_each_reference(f),
            _ => {}
        }
    }
}

#[derive(Debug, Clone)]
pub struct StepEntity {
    pub id: u64,
    pub entity_type: String,
    pub values: Vec<StepValue>,
    /// Original record text, kept until the entity is modified.
    raw: Option<String>,
}

impl StepEntity {
    #[must_use]
    pub fn new(id: u64, entity_type: impl Into<String>, values: Vec<StepValue>) -> Self {
        Self {
            id,
            entity_type: entity_type.into(),
            values,
            raw: None,
        }
    }

    fn opaque(id: u64, record: &str) -> Self {
        Self {
            id,
            entity_type: COMPLEX_ENTITY.to_string(),
            values: Vec::new(),
            raw: Some(record.to_string()),
        }
    }

    /// The record text as it appeared in the source file, if unchanged.
    #[must_use]
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    #[must_use]
    pub fn is_opaque(&self) -> bool {
        self.entity_type == COMPLEX_ENTITY
    }

    #[must_use]
    pub fn attr(&self, index: usize) -> Option<&StepValue> {
        self.values.get(index)
    }

    #[must_use]
    pub fn str_attr(&self, index: usize) -> Option<&str> {
        self.attr(index).and_then(StepValue::as_str)
    }

    #[must_use]
    pub fn ref_attr(&self, index: usize) -> Option<u64> {
        self.attr(index).and_then(StepValue::as_reference)
    }

    #[must_use]
    pub fn ref_list_attr(&self, index: usize) -> Vec<u64> {
        self.attr(index).map(StepValue::references).unwrap_or_default()
    }

    /// Visits every reference the entity makes. Opaque complex instances
    /// have no parsed values, so their record text is scanned instead.
    pub fn for_each_reference(&self, f: &mut impl FnMut(u64)) {
        if self.is_opaque() {
            if let Some(raw) = &self.raw {
                scan_raw_references(raw, f);
            }
            return;
        }
        for value in &self.values {
            value.for_each_reference(f);
        }
    }

    /// Sets an attribute, padding missing positions with `$`.
    pub fn set_attr(&mut self, index: usize, value: StepValue) {
        if self.values.len() <= index {
            self.values.resize(index + 1, StepValue::Null);
        }
        self.values[index] = value;
        self.raw = None;
    }
}

/// A parsed STEP physical file. Entities are kept in id order.
#[derive(Debug, Clone)]
pub struct StepFile {
    /// Everything before the DATA section, verbatim.
    pub header: String,
    pub schema: String,
    entities: BTreeMap<u64, StepEntity>,
}

struct Record {
    start: usize,
    text: String,
}

impl StepFile {
    pub fn parse(content: &str) -> Result<Self, LoadError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut records = split_records(content).into_iter();

        match records.next() {
            Some(first) if first.text.trim() == MAGIC => {}
            _ => return Err(invalid(format!("missing {MAGIC} header"))),
        }

        let mut schema = String::new();
        let mut header_end = None;
        let mut entities = BTreeMap::new();
        let mut in_data = false;

        for record in records {
            let text = record.text.trim();

            if !in_data {
                if is_data_keyword(text) {
                    in_data = true;
                    header_end.get_or_insert(record.start);
                } else if text.starts_with("FILE_SCHEMA") {
                    schema = parse_schema(text);
                }
                continue;
            }

            if text == "ENDSEC" {
                in_data = false;
                continue;
            }

            if text.starts_with('#') {
                let entity = parse_entity_record(text)?;
                let id = entity.id;
                if entities.insert(id, entity).is_some() {
                    return Err(invalid(format!("duplicate entity id #{id}")));
                }
            } else if !text.is_empty() {
                return Err(invalid(format!(
                    "unexpected record in DATA section: '{}'",
                    preview(text)
                )));
            }
        }

        let header_end = header_end.ok_or_else(|| invalid("missing DATA section".to_string()))?;
        let header = content[..header_end].trim_end().to_string();

        Ok(StepFile {
            header,
            schema,
            entities,
        })
    }

    #[must_use]
    pub fn get_entity(&self, id: u64) -> Option<&StepEntity> {
        self.entities.get(&id)
    }

    /// Mutable access to an entity. The entity will be re-serialized on write.
    /// Opaque complex instances cannot be edited.
    pub fn entity_mut(&mut self, id: u64) -> Option<&mut StepEntity> {
        let entity = self.entities.get_mut(&id).filter(|e| !e.is_opaque())?;
        entity.raw = None;
        Some(entity)
    }

    #[must_use]
    pub fn get_entities_by_type(&self, entity_type: &str) -> Vec<&StepEntity> {
        self.entities
            .values()
            .filter(|e| e.entity_type == entity_type)
            .collect()
    }

    pub fn entities(&self) -> impl Iterator<Item = &StepEntity> {
        self.entities.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[must_use]
    pub fn next_id(&self) -> u64 {
        self.entities.last_key_value().map_or(1, |(id, _)| id + 1)
    }

    /// Appends a new entity and returns its id.
    pub fn add_entity(&mut self, entity_type: &str, values: Vec<StepValue>) -> u64 {
        let id = self.next_id();
        self.entities
            .insert(id, StepEntity::new(id, entity_type, values));
        id
    }

    pub fn remove_entity(&mut self, id: u64) -> Option<StepEntity> {
        self.entities.remove(&id)
    }

    #[must_use]
    pub fn is_referenced(&self, id: u64) -> bool {
        let mut found = false;
        for entity in self.entities.values() {
            entity.for_each_reference(&mut |r| found |= r == id);
            if found {
                return true;
            }
        }
        false
    }

    /// Number of inbound references per entity id.
    #[must_use]
    pub fn reference_counts(&self) -> HashMap<u64, usize> {
        let mut counts = HashMap::new();
        for entity in self.entities.values() {
            entity.for_each_reference(&mut |r| *counts.entry(r).or_insert(0) += 1);
        }
        counts
    }
}

fn invalid(message: String) -> LoadError {
    LoadError::InvalidStep { message }
}

fn preview(text: &str) -> String {
    let mut short: String = text.chars().take(60).collect();
    if short.len() < text.len() {
        short.push_str("...");
    }
    short
}

/// `#n` tokens outside string literals, after the record's own `#id=`.
fn scan_raw_references(record: &str, f: &mut impl FnMut(u64)) {
    let body = record.find('=').map_or(record, |eq| &record[eq + 1..]);
    let mut in_string = false;
    let mut chars = body.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' => in_string = !in_string,
            '#' if !in_string => {
                let mut digits = String::new();
                while let Some(d) = chars.next_if(char::is_ascii_digit) {
                    digits.push(d);
                }
                if let Ok(id) = digits.parse() {
                    f(id);
                }
            }
            _ => {}
        }
    }
}

fn is_data_keyword(text: &str) -> bool {
    text == "DATA" || (text.starts_with("DATA") && text[4..].trim_start().starts_with('('))
}

fn parse_schema(text: &str) -> String {
    // FILE_SCHEMA(('IFC4'))
    text.find('\'')
        .and_then(|start| {
            let rest = &text[start + 1..];
            rest.find('\'').map(|end| rest[..end].to_string())
        })
        .unwrap_or_default()
}

/// Splits the file into `;`-terminated records, ignoring separators inside
/// string literals and dropping `/* */` comments.
fn split_records(content: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let mut current = String::new();
    let mut start = 0;
    let mut in_string = false;
    let mut chars = content.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        if in_string {
            current.push(ch);
            if ch == '\'' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '\'' => {
                in_string = true;
                current.push(ch);
            }
            '/' if matches!(chars.peek(), Some((_, '*'))) => {
                chars.next();
                let mut prev = '\0';
                for (_, c) in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            ';' => {
                records.push(Record {
                    start,
                    text: std::mem::take(&mut current),
                });
                start = i + 1;
            }
            _ => current.push(ch),
        }
    }

    // An unterminated trailing record still has to reach the entity parser
    if !current.trim().is_empty() {
        records.push(Record {
            start,
            text: current,
        });
    }

    records
}

fn parse_entity_record(text: &str) -> Result<StepEntity, LoadError> {
    // Format: #123=IFCWALL('guid',#ref,'name',...)
    let malformed = || invalid(format!("malformed entity record '{}'", preview(text)));

    let eq_pos = text.find('=').ok_or_else(malformed)?;
    let id: u64 = text[1..eq_pos].trim().parse().map_err(|_| malformed())?;

    let rest = text[eq_pos + 1..].trim();
    if rest.starts_with('(') {
        return Ok(StepEntity::opaque(id, text));
    }

    let paren_pos = rest.find('(').ok_or_else(malformed)?;
    if !rest.ends_with(')') {
        return Err(malformed());
    }

    let entity_type = rest[..paren_pos].trim().to_ascii_uppercase();
    if entity_type.is_empty()
        || !entity_type
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(malformed());
    }

    let values = parse_values(&rest[paren_pos + 1..rest.len() - 1])
        .map_err(|message| invalid(format!("entity #{id}: {message}")))?;

    Ok(StepEntity {
        id,
        entity_type,
        values,
        raw: Some(text.to_string()),
    })
}

fn parse_values(s: &str) -> Result<Vec<StepValue>, String> {
    let mut values = Vec::new();
    if s.trim().is_empty() {
        return Ok(values);
    }

    let mut current = String::new();
    let mut in_string = false;
    let mut paren_depth = 0usize;

    for ch in s.chars() {
        if in_string {
            // '' toggles out and straight back in
            if ch == '\'' {
                in_string = false;
            }
            current.push(ch);
            continue;
        }

        match ch {
            '\'' => {
                in_string = true;
                current.push(ch);
            }
            '(' => {
                paren_depth += 1;
                current.push(ch);
            }
            ')' => {
                paren_depth = paren_depth
                    .checked_sub(1)
                    .ok_or_else(|| "unbalanced parentheses".to_string())?;
                current.push(ch);
            }
            ',' if paren_depth == 0 => {
                values.push(parse_single_value(&current)?);
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if in_string {
        return Err("unterminated string".to_string());
    }
    if paren_depth != 0 {
        return Err("unbalanced parentheses".to_string());
    }

    values.push(parse_single_value(&current)?);
    Ok(values)
}

fn parse_single_value(s: &str) -> Result<StepValue, String> {
    let s = s.trim();

    match s {
        "" => return Err("empty attribute".to_string()),
        "$" => return Ok(StepValue::Null),
        "*" => return Ok(StepValue::Derived),
        _ => {}
    }

    if let Some(stripped) = s.strip_prefix('#') {
        return stripped
            .trim()
            .parse::<u64>()
            .map(StepValue::Reference)
            .map_err(|_| format!("invalid reference '{s}'"));
    }

    let wrapped = |open: char, close: char| s.len() >= 2 && s.starts_with(open) && s.ends_with(close);

    if wrapped('\'', '\'') {
        return Ok(StepValue::String(decode_step_string(&s[1..s.len() - 1])));
    }
    if wrapped('"', '"') {
        return Ok(StepValue::Binary(s[1..s.len() - 1].to_string()));
    }
    if wrapped('.', '.') {
        return Ok(match &s[1..s.len() - 1] {
            "T" => StepValue::Boolean(true),
            "F" => StepValue::Boolean(false),
            inner => StepValue::Enum(inner.to_string()),
        });
    }
    if wrapped('(', ')') {
        return parse_values(&s[1..s.len() - 1]).map(StepValue::List);
    }

    let numeric = s
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '-' || c == '+');
    if numeric {
        if let Ok(i) = s.parse::<i64>() {
            return Ok(StepValue::Integer(i));
        }
        if let Ok(f) = s.parse::<f64>() {
            return Ok(StepValue::Real(f));
        }
    }

    // Typed value like IFCBOOLEAN(.T.)
    if s.starts_with(|c: char| c.is_ascii_alphabetic()) && s.ends_with(')') {
        if let Some(paren_pos) = s.find('(') {
            let type_name = s[..paren_pos].trim().to_ascii_uppercase();
            let mut inner = parse_values(&s[paren_pos + 1..s.len() - 1])?;
            let value = if inner.len() == 1 {
                inner.remove(0)
            } else {
                StepValue::List(inner)
            };
            return Ok(StepValue::Typed(type_name, Box::new(value)));
        }
    }

    Err(format!("unrecognized value '{s}'"))
}

/// Decode STEP/IFC encoded strings with Unicode escape sequences.
/// Supports:
/// - `\X2\XXXX\X0\` - 2-byte Unicode (BMP), can have multiple 4-char hex codes
/// - `\X4\XXXXXXXX\X0\` - 4-byte Unicode
/// - `\X\XX` - 1-byte ISO 8859-1
/// - `\S\c` - ISO 8859-1 high half
/// - `\\` - escaped backslash
/// - `''` - escaped apostrophe
#[must_use]
pub fn decode_step_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => decode_escape(&mut chars, &mut result),
            '\'' => {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                }
                result.push('\'');
            }
            _ => result.push(ch),
        }
    }

    result
}

fn decode_escape(chars: &mut Peekable<Chars<'_>>, out: &mut String) {
    match chars.peek().copied() {
        Some('\\') => {
            chars.next();
            out.push('\\');
        }
        Some('S') => {
            chars.next();
            if chars.peek() == Some(&'\\') {
                chars.next();
            }
            if let Some(high) = chars.next().and_then(|c| char::from_u32(u32::from(c) + 0x80)) {
                out.push(high);
            }
        }
        Some('X') => {
            chars.next();
            match chars.peek().copied() {
                Some('\\') => {
                    chars.next();
                    let hex: String = chars.by_ref().take(2).collect();
                    match u8::from_str_radix(&hex, 16) {
                        Ok(code) => out.push(char::from(code)),
                        Err(_) => {
                            out.push_str("\\X\\");
                            out.push_str(&hex);
                        }
                    }
                }
                Some(width @ ('2' | '4')) => {
                    chars.next();
                    if chars.peek() == Some(&'\\') {
                        chars.next();
                    }
                    let digits = if width == '2' { 4 } else { 8 };

                    let mut hex = String::new();
                    while let Some(&c) = chars.peek() {
                        if c == '\\' {
                            break;
                        }
                        hex.push(c);
                        chars.next();
                    }

                    let closing: String = chars.clone().take(4).collect();
                    if closing == "\\X0\\" {
                        chars.nth(3);
                    }

                    for chunk in hex.as_bytes().chunks(digits) {
                        let code = std::str::from_utf8(chunk)
                            .ok()
                            .filter(|_| chunk.len() == digits)
                            .and_then(|text| u32::from_str_radix(text, 16).ok())
                            .and_then(char::from_u32);
                        if let Some(c) = code {
                            out.push(c);
                        }
                    }
                }
                _ => out.push_str("\\X"),
            }
        }
        _ => out.push('\\'),
    }
}

/// Encode a string for a STEP string literal (without the surrounding quotes).
/// Characters outside printable ASCII are written as `\X2\` or `\X4\` runs.
#[must_use]
pub fn encode_step_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    // Some(false) = open \X2\ run, Some(true) = open \X4\ run
    let mut open: Option<bool> = None;

    for c in s.chars() {
        let code = u32::from(c);

        if (0x20..=0x7E).contains(&code) {
            if open.take().is_some() {
                out.push_str("\\X0\\");
            }
            match c {
                '\'' => out.push_str("''"),
                '\\' => out.push_str("\\\\"),
                _ => out.push(c),
            }
            continue;
        }

        let wide = code > 0xFFFF;
        if open != Some(wide) {
            if open.is_some() {
                out.push_str("\\X0\\");
            }
            out.push_str(if wide { "\\X4\\" } else { "\\X2\\" });
            open = Some(wide);
        }
        if wide {
            let _ = write!(out, "{code:08X}");
        } else {
            let _ = write!(out, "{code:04X}");
        }
    }

    if open.is_some() {
        out.push_str("\\X0\\");
    }

    out
}
