use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Class index → display name mapping for a model.
///
/// Ultralytics ONNX exports embed the mapping as a Python dict literal in
/// the `names` metadata entry, e.g. `{0: 'stop', 1: 'yield'}`. Models
/// without it can ship a `.names` sidecar with one name per line.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClassNames {
    names: BTreeMap<usize, String>,
}

impl ClassNames {
    pub fn new(names: BTreeMap<usize, String>) -> Self {
        Self { names }
    }

    /// Names indexed by position.
    pub fn from_list<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names
                .into_iter()
                .enumerate()
                .map(|(i, n)| (i, n.into()))
                .collect(),
        }
    }

    /// Parses the dict literal from Ultralytics export metadata.
    ///
    /// Returns `None` on any syntax error.
    pub fn parse_metadata(raw: &str) -> Option<Self> {
        DictParser::new(raw).parse().map(Self::new)
    }

    /// Reads a sidecar file: one name per line, blank lines skipped.
    pub fn read_sidecar(path: &Path) -> std::io::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::from_list(
            content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        ))
    }

    /// Name for `class_id`, or `class_<id>` when the model didn't name it.
    pub fn name(&self, class_id: usize) -> String {
        self.names
            .get(&class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{class_id}"))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

struct DictParser<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> DictParser<'a> {
    fn new(raw: &'a str) -> Self {
        Self {
            chars: raw.chars().peekable(),
        }
    }

    fn parse(mut self) -> Option<BTreeMap<usize, String>> {
        let mut out = BTreeMap::new();
        self.expect('{')?;
        loop {
            self.skip_ws();
            if self.chars.peek() == Some(&'}') {
                self.chars.next();
                break;
            }
            let key = self.integer()?;
            self.expect(':')?;
            let value = self.quoted()?;
            out.insert(key, value);
            self.skip_ws();
            match self.chars.next()? {
                ',' => continue,
                '}' => break,
                _ => return None,
            }
        }
        self.skip_ws();
        if self.chars.next().is_some() {
            return None;
        }
        Some(out)
    }

    fn skip_ws(&mut self) {
        while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn expect(&mut self, want: char) -> Option<()> {
        self.skip_ws();
        (self.chars.next()? == want).then_some(())
    }

    fn integer(&mut self) -> Option<usize> {
        self.skip_ws();
        let mut digits = String::new();
        while let Some(&c) = self.chars.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            digits.push(c);
            self.chars.next();
        }
        digits.parse().ok()
    }

    fn quoted(&mut self) -> Option<String> {
        self.skip_ws();
        let quote = self.chars.next()?;
        if quote != '\'' && quote != '"' {
            return None;
        }
        let mut value = String::new();
        loop {
            match self.chars.next()? {
                '\\' => value.push(self.chars.next()?),
                c if c == quote => return Some(value),
                c => value.push(c),
            }
        }
    }
}
