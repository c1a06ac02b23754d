//! Module with the reader type, the leaf readers and the reader interpreter.
//!
//! A reader is a function of `(text, offset, context)` that returns a [`ReadResult`]:
//! * a value `>= offset` means success and the reader consumed `offset..value`,
//! * [`NO_MATCH`] means the reader does not match at `offset`,
//! * any other negative value is an application error code that is propagated unchanged by every
//!   combinator wrapping the failing reader.

use std::sync::Arc;

use log::trace;
use regex_automata::{meta, Anchored, Input};

use crate::{CharSet, Result, StreamlexError, StreamlexErrorKind};

/// The result of a read operation. See the module documentation for its contract.
pub type ReadResult = isize;

/// The result returned by readers that do not match.
pub const NO_MATCH: ReadResult = -1;

/// Signature of user supplied readers.
pub type ReadFn<C> = dyn Fn(&[u8], usize, &C) -> ReadResult + Send + Sync;

/// A reader that matches a span of the input.
///
/// `Reader` is a cheap handle; cloning it shares the underlying reader. The identity of a reader
/// (see [`Reader::ptr_eq`]) is what the rule tree uses to merge rules with a common prefix, so
/// reuse a reader value instead of constructing the same reader twice when rules should share it.
pub struct Reader<C = ()> {
    pub(crate) inner: Arc<ReaderKind<C>>,
}

/// The closed set of reader kinds.
pub(crate) enum ReaderKind<C> {
    /// Never matches.
    Never,
    /// Always matches without consuming input.
    Always,
    /// Matches the exact code units.
    Text(Vec<u8>),
    /// Matches the code units ignoring ASCII case. Stored lower case.
    TextCi(Vec<u8>),
    /// Matches a single code unit out of the set.
    Set(CharSet),
    /// Matches a regular expression anchored at the offset.
    Regex(RegexReader),
    /// Matches without consuming input at the end of the text only.
    End,
    /// Consumes a fixed number of code units.
    Skip(usize),
    /// All readers in order.
    Sequence(Vec<Reader<C>>),
    /// The first reader that does not return `NO_MATCH`.
    Alternation(Vec<Reader<C>>),
    /// A bounded repetition. `max == None` means unbounded.
    Repeat {
        reader: Reader<C>,
        min: usize,
        max: Option<usize>,
    },
    /// The reader or an empty match.
    Optional(Reader<C>),
    /// Checks the reader without consuming input.
    Lookahead(Reader<C>),
    /// Skips code units until the reader matches.
    Until {
        reader: Reader<C>,
        inclusive: bool,
        open: bool,
    },
    /// A user supplied read function.
    Custom(Box<ReadFn<C>>),
}

/// A compiled regular expression together with its source pattern.
pub(crate) struct RegexReader {
    pub(crate) pattern: String,
    pub(crate) regex: meta::Regex,
}

impl<C> Clone for Reader<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> Reader<C> {
    pub(crate) fn from_kind(kind: ReaderKind<C>) -> Self {
        Self {
            inner: Arc::new(kind),
        }
    }

    #[inline]
    pub(crate) fn kind(&self) -> &ReaderKind<C> {
        &self.inner
    }

    /// A reader that never matches.
    pub fn never() -> Self {
        Self::from_kind(ReaderKind::Never)
    }

    /// A reader that always matches without consuming input.
    pub fn always() -> Self {
        Self::from_kind(ReaderKind::Always)
    }

    /// A reader matching the given text literally.
    pub fn text(text: impl AsRef<[u8]>) -> Self {
        let text = text.as_ref();
        if text.is_empty() {
            Self::always()
        } else {
            Self::from_kind(ReaderKind::Text(text.to_vec()))
        }
    }

    /// A reader matching the given text ignoring ASCII case.
    pub fn text_ci(text: impl AsRef<[u8]>) -> Self {
        let text = text.as_ref();
        if text.is_empty() {
            Self::always()
        } else if !text.iter().any(|b| b.is_ascii_alphabetic()) {
            Self::from_kind(ReaderKind::Text(text.to_vec()))
        } else {
            Self::from_kind(ReaderKind::TextCi(text.to_ascii_lowercase()))
        }
    }

    /// A reader matching a single character in either its upper or lower case form.
    ///
    /// Returns an error if the case forms of the character are not single characters of the same
    /// encoded length.
    pub fn char_ci(c: char) -> Result<Self> {
        let mut lower = c.to_lowercase();
        let mut upper = c.to_uppercase();
        let (Some(l), None, Some(u), None) =
            (lower.next(), lower.next(), upper.next(), upper.next())
        else {
            return Err(StreamlexError::new(StreamlexErrorKind::CaseMismatch(c)));
        };
        if l.len_utf8() != u.len_utf8() {
            return Err(StreamlexError::new(StreamlexErrorKind::CaseMismatch(c)));
        }
        let mut buf = [0; 4];
        if l == u {
            return Ok(Self::text(l.encode_utf8(&mut buf).as_bytes()));
        }
        if l.is_ascii() {
            return Ok(Self::char_set(CharSet::from_bytes(&[l as u8, u as u8])));
        }
        let lower = Self::text(l.encode_utf8(&mut buf).as_bytes());
        let upper = Self::text(u.encode_utf8(&mut buf).as_bytes());
        Ok(crate::alternation([lower, upper]))
    }

    /// A reader matching one code unit out of the given ones.
    pub fn one_of(units: impl AsRef<[u8]>) -> Self {
        Self::char_set(CharSet::from_bytes(units.as_ref()))
    }

    /// A reader matching one code unit that is not one of the given ones.
    pub fn none_of(units: impl AsRef<[u8]>) -> Self {
        Self::char_set(CharSet::from_bytes(units.as_ref()).negate())
    }

    /// A reader matching one code unit in the inclusive range.
    pub fn char_range(lo: u8, hi: u8) -> Result<Self> {
        Ok(Self::char_set(CharSet::range(lo, hi)?))
    }

    /// A reader matching one code unit out of the set.
    pub fn char_set(set: CharSet) -> Self {
        if set.is_empty() {
            Self::never()
        } else {
            Self::from_kind(ReaderKind::Set(set))
        }
    }

    /// A reader matching the regular expression anchored at the read offset.
    pub fn regex(pattern: &str) -> Result<Self> {
        parse_regex_syntax(pattern)?;
        let regex = meta::Regex::new(pattern).map_err(|e| {
            StreamlexError::new(StreamlexErrorKind::RegexBuildError(format!(
                "'{}': {}",
                pattern, e
            )))
        })?;
        Ok(Self::from_kind(ReaderKind::Regex(RegexReader {
            pattern: pattern.to_string(),
            regex,
        })))
    }

    /// A reader that matches without consuming input at the end of the text.
    pub fn end() -> Self {
        Self::from_kind(ReaderKind::End)
    }

    /// A reader that consumes `n` code units if available.
    pub fn skip(n: usize) -> Self {
        if n == 0 {
            Self::always()
        } else {
            Self::from_kind(ReaderKind::Skip(n))
        }
    }

    /// A reader calling the given function.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&[u8], usize, &C) -> ReadResult + Send + Sync + 'static,
    {
        Self::from_kind(ReaderKind::Custom(Box::new(f)))
    }

    /// Checks if both readers are the same reader.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The identity of the reader used to deduplicate bound values.
    #[inline]
    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    /// Checks if the reader is known to never match.
    pub fn is_never(&self) -> bool {
        matches!(self.kind(), ReaderKind::Never)
    }

    /// Checks if the reader is known to always match without consuming input.
    pub fn is_always(&self) -> bool {
        matches!(self.kind(), ReaderKind::Always)
    }

    /// Checks if the reader is known to never return `NO_MATCH`. It can still return application
    /// errors.
    pub(crate) fn never_fails(&self) -> bool {
        match self.kind() {
            ReaderKind::Always | ReaderKind::Optional(_) => true,
            ReaderKind::Repeat { min, .. } => *min == 0,
            ReaderKind::Until { open, .. } => *open,
            _ => false,
        }
    }

    /// Reads from `text` at `offset`.
    pub fn read(&self, text: &[u8], offset: usize, ctx: &C) -> ReadResult {
        if offset > text.len() {
            return NO_MATCH;
        }
        match self.kind() {
            ReaderKind::Never => NO_MATCH,
            ReaderKind::Always => offset as ReadResult,
            ReaderKind::Text(t) => {
                if text[offset..].starts_with(t) {
                    (offset + t.len()) as ReadResult
                } else {
                    NO_MATCH
                }
            }
            ReaderKind::TextCi(t) => match text.get(offset..offset + t.len()) {
                Some(s) if s.eq_ignore_ascii_case(t) => (offset + t.len()) as ReadResult,
                _ => NO_MATCH,
            },
            ReaderKind::Set(set) => match text.get(offset) {
                Some(b) if set.contains(*b) => (offset + 1) as ReadResult,
                _ => NO_MATCH,
            },
            ReaderKind::Regex(rx) => rx.read(text, offset),
            ReaderKind::End => {
                if offset == text.len() {
                    offset as ReadResult
                } else {
                    NO_MATCH
                }
            }
            ReaderKind::Skip(n) => {
                match offset.checked_add(*n).filter(|end| *end <= text.len()) {
                    Some(end) => end as ReadResult,
                    None => NO_MATCH,
                }
            }
            ReaderKind::Sequence(readers) => {
                let mut pos = offset;
                for reader in readers {
                    let r = reader.read(text, pos, ctx);
                    if r < 0 {
                        return r;
                    }
                    pos = r as usize;
                }
                pos as ReadResult
            }
            ReaderKind::Alternation(readers) => {
                for reader in readers {
                    let r = reader.read(text, offset, ctx);
                    if r != NO_MATCH {
                        return r;
                    }
                }
                NO_MATCH
            }
            ReaderKind::Repeat { reader, min, max } => {
                let mut count = 0;
                let mut pos = offset;
                while max.map_or(true, |max| count < max) {
                    let r = reader.read(text, pos, ctx);
                    if r == NO_MATCH {
                        break;
                    }
                    if r < 0 {
                        return r;
                    }
                    if r as usize == pos {
                        // A non-advancing match would match forever.
                        break;
                    }
                    pos = r as usize;
                    count += 1;
                }
                if count >= *min {
                    pos as ReadResult
                } else {
                    NO_MATCH
                }
            }
            ReaderKind::Optional(reader) => {
                let r = reader.read(text, offset, ctx);
                if r == NO_MATCH {
                    offset as ReadResult
                } else {
                    r
                }
            }
            ReaderKind::Lookahead(reader) => {
                let r = reader.read(text, offset, ctx);
                if r >= 0 {
                    offset as ReadResult
                } else {
                    r
                }
            }
            ReaderKind::Until {
                reader,
                inclusive,
                open,
            } => {
                for pos in offset..=text.len() {
                    let r = reader.read(text, pos, ctx);
                    if r >= 0 {
                        return if *inclusive { r } else { pos as ReadResult };
                    }
                    if r != NO_MATCH {
                        return r;
                    }
                }
                if *open {
                    text.len() as ReadResult
                } else {
                    NO_MATCH
                }
            }
            ReaderKind::Custom(f) => f(text, offset, ctx),
        }
    }
}

impl RegexReader {
    fn read(&self, text: &[u8], offset: usize) -> ReadResult {
        let input = Input::new(text).range(offset..).anchored(Anchored::Yes);
        self.regex
            .find(input)
            .map_or(NO_MATCH, |m| m.end() as ReadResult)
    }
}

/// Parse the regex syntax to report syntax errors with their position in the pattern.
fn parse_regex_syntax(pattern: &str) -> Result<regex_syntax::ast::Ast> {
    let now = std::time::Instant::now();
    let ast = regex_syntax::ast::parse::Parser::new().parse(pattern)?;
    trace!(
        "Parsing regex '{}' took {} microseconds.",
        pattern.escape_default(),
        now.elapsed().as_micros()
    );
    Ok(ast)
}

impl<C> std::fmt::Debug for Reader<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind() {
            ReaderKind::Never => write!(f, "never"),
            ReaderKind::Always => write!(f, "always"),
            ReaderKind::Text(t) => write!(f, "{:?}", String::from_utf8_lossy(t)),
            ReaderKind::TextCi(t) => write!(f, "i{:?}", String::from_utf8_lossy(t)),
            ReaderKind::Set(set) => write!(f, "{:?}", set),
            ReaderKind::Regex(rx) => write!(f, "/{}/", rx.pattern),
            ReaderKind::End => write!(f, "end"),
            ReaderKind::Skip(n) => write!(f, "skip({})", n),
            ReaderKind::Sequence(readers) => f.debug_tuple("seq").field(readers).finish(),
            ReaderKind::Alternation(readers) => f.debug_tuple("alt").field(readers).finish(),
            ReaderKind::Repeat { reader, min, max } => match max {
                Some(max) => write!(f, "repeat({:?}, {}, {})", reader, min, max),
                None => write!(f, "repeat({:?}, {}, ..)", reader, min),
            },
            ReaderKind::Optional(reader) => write!(f, "optional({:?})", reader),
            ReaderKind::Lookahead(reader) => write!(f, "lookahead({:?})", reader),
            ReaderKind::Until {
                reader,
                inclusive,
                open,
            } => write!(
                f,
                "until({:?}, inclusive: {}, open: {})",
                reader, inclusive, open
            ),
            ReaderKind::Custom(_) => write!(f, "custom"),
        }
    }
}
