//! Module with the structural reader combinators.
//!
//! All combinators normalize their arguments to keep reader trees small: nested sequences and
//! alternations are flattened, and readers known to never match or to always match are folded
//! away where that does not change the observable result.

use crate::reader::{Reader, ReaderKind};

/// A reader that succeeds only if all readers succeed in order, each starting where the previous
/// one ended. The first failure or application error is returned.
///
/// An empty sequence always matches without consuming input.
pub fn sequence<C>(readers: impl IntoIterator<Item = Reader<C>>) -> Reader<C> {
    let mut flat: Vec<Reader<C>> = Vec::new();
    for reader in readers {
        match reader.kind() {
            ReaderKind::Sequence(inner) => flat.extend(inner.iter().cloned()),
            ReaderKind::Always => {}
            _ => flat.push(reader),
        }
    }
    // Nothing in front of a leading `never` could produce an application error.
    if flat.first().is_some_and(Reader::is_never) {
        return Reader::never();
    }
    match flat.len() {
        0 => Reader::always(),
        1 => flat.pop().unwrap_or_else(Reader::always),
        _ => Reader::from_kind(ReaderKind::Sequence(flat)),
    }
}

/// A reader returning the result of the first reader that does not return `NO_MATCH`.
///
/// Application errors are returned immediately and do not fall through to the next reader.
pub fn alternation<C>(readers: impl IntoIterator<Item = Reader<C>>) -> Reader<C> {
    let mut flat: Vec<Reader<C>> = Vec::new();
    for reader in readers {
        let items = match reader.kind() {
            ReaderKind::Alternation(inner) => inner.clone(),
            _ => vec![reader],
        };
        for item in items {
            if item.is_never() {
                continue;
            }
            let stop = item.never_fails();
            flat.push(item);
            if stop {
                // Readers behind this one are unreachable.
                return finish_alternation(flat);
            }
        }
    }
    finish_alternation(flat)
}

fn finish_alternation<C>(mut flat: Vec<Reader<C>>) -> Reader<C> {
    match flat.len() {
        0 => Reader::never(),
        1 => flat.pop().unwrap_or_else(Reader::never),
        _ => Reader::from_kind(ReaderKind::Alternation(flat)),
    }
}

/// A reader applying `reader` repeatedly, at least `min` and at most `max` times. A `max` of
/// `None` means no upper bound.
///
/// The repetition stops early at the first `NO_MATCH` or at a match that does not advance. The
/// latter counts as satisfying all remaining required repetitions since it would match forever.
pub fn repeat<C>(reader: Reader<C>, min: usize, max: Option<usize>) -> Reader<C> {
    if let Some(max) = max {
        if max == 0 {
            return Reader::always();
        }
        if max < min {
            return Reader::never();
        }
    }
    if reader.is_never() {
        return if min == 0 {
            Reader::always()
        } else {
            Reader::never()
        };
    }
    if reader.is_always() {
        return reader;
    }
    match (min, max) {
        (0, Some(1)) => optional(reader),
        (1, Some(1)) => reader,
        _ => Reader::from_kind(ReaderKind::Repeat { reader, min, max }),
    }
}

/// Shorthand for `repeat(reader, 0, None)`.
pub fn zero_or_more<C>(reader: Reader<C>) -> Reader<C> {
    repeat(reader, 0, None)
}

/// Shorthand for `repeat(reader, 1, None)`.
pub fn one_or_more<C>(reader: Reader<C>) -> Reader<C> {
    repeat(reader, 1, None)
}

/// A reader returning the result of `reader`, or the read offset if `reader` does not match.
/// It never returns `NO_MATCH`.
pub fn optional<C>(reader: Reader<C>) -> Reader<C> {
    if reader.is_never() {
        return Reader::always();
    }
    if reader.never_fails() {
        return reader;
    }
    Reader::from_kind(ReaderKind::Optional(reader))
}

/// A reader that matches without consuming input if `reader` matches. Application errors of
/// `reader` are propagated.
pub fn lookahead<C>(reader: Reader<C>) -> Reader<C> {
    match reader.kind() {
        ReaderKind::Never | ReaderKind::Always | ReaderKind::Lookahead(_) => reader,
        _ => Reader::from_kind(ReaderKind::Lookahead(reader)),
    }
}

/// A reader that advances one code unit at a time until `reader` matches.
///
/// Returns the position in front of the match, or behind it if `inclusive` is set. Returns
/// `NO_MATCH` if the end of the text is reached without a match.
pub fn until<C>(reader: Reader<C>, inclusive: bool) -> Reader<C> {
    make_until(reader, inclusive, false)
}

/// Like [`until`], but returns the end of the text instead of `NO_MATCH` if `reader` never
/// matches.
pub fn until_open<C>(reader: Reader<C>, inclusive: bool) -> Reader<C> {
    make_until(reader, inclusive, true)
}

fn make_until<C>(reader: Reader<C>, inclusive: bool, open: bool) -> Reader<C> {
    if reader.is_always() {
        return reader;
    }
    Reader::from_kind(ReaderKind::Until {
        reader,
        inclusive,
        open,
    })
}

impl<C> Reader<C> {
    /// Sequence of `self` followed by `next`.
    pub fn then(&self, next: &Reader<C>) -> Reader<C> {
        sequence([self.clone(), next.clone()])
    }

    /// Alternation of `self` and `other`.
    pub fn or(&self, other: &Reader<C>) -> Reader<C> {
        alternation([self.clone(), other.clone()])
    }

    /// See [`repeat`].
    pub fn repeat(&self, min: usize, max: Option<usize>) -> Reader<C> {
        repeat(self.clone(), min, max)
    }

    /// See [`zero_or_more`].
    pub fn zero_or_more(&self) -> Reader<C> {
        zero_or_more(self.clone())
    }

    /// See [`one_or_more`].
    pub fn one_or_more(&self) -> Reader<C> {
        one_or_more(self.clone())
    }

    /// See [`optional`].
    pub fn optional(&self) -> Reader<C> {
        optional(self.clone())
    }

    /// See [`lookahead`].
    pub fn lookahead(&self) -> Reader<C> {
        lookahead(self.clone())
    }

    /// A reader skipping input until `self` matches. See [`until`].
    pub fn until(&self, inclusive: bool) -> Reader<C> {
        until(self.clone(), inclusive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ReadResult, NO_MATCH};

    fn read(reader: &Reader, text: &str, offset: usize) -> ReadResult {
        reader.read(text.as_bytes(), offset, &())
    }

    fn fail_with(code: ReadResult) -> Reader {
        Reader::custom(move |_, _, _| code)
    }

    #[test]
    fn test_sequence() {
        let r = sequence([Reader::text("a"), Reader::text("b"), Reader::text("c")]);
        assert_eq!(read(&r, "abcd", 0), 3);
        assert_eq!(read(&r, "abd", 0), NO_MATCH);
        let r = sequence([Reader::text("a"), fail_with(-5), Reader::text("c")]);
        assert_eq!(read(&r, "ac", 0), -5);
        assert!(sequence::<()>([]).is_always());
    }

    #[test]
    fn test_sequence_flattening() {
        let ab = sequence([Reader::<()>::text("a"), Reader::text("b")]);
        let r = sequence([ab, Reader::always(), Reader::text("c")]);
        match r.kind() {
            ReaderKind::Sequence(items) => assert_eq!(items.len(), 3),
            _ => panic!("expected a sequence"),
        }
        let single = Reader::<()>::text("x");
        assert!(sequence([Reader::always(), single.clone()]).ptr_eq(&single));
        assert!(sequence([Reader::<()>::never(), single]).is_never());
    }

    #[test]
    fn test_alternation() {
        let r = alternation([Reader::text("ab"), Reader::text("a")]);
        assert_eq!(read(&r, "ab", 0), 2);
        assert_eq!(read(&r, "ac", 0), 1);
        assert_eq!(read(&r, "c", 0), NO_MATCH);
        // Application errors do not fall through.
        let r = alternation([fail_with(-9), Reader::text("a")]);
        assert_eq!(read(&r, "a", 0), -9);
    }

    #[test]
    fn test_alternation_normalization() {
        let a = Reader::<()>::text("a");
        let r = alternation([Reader::never(), a.clone(), Reader::never()]);
        assert!(r.ptr_eq(&a));
        let r = alternation([
            alternation([Reader::<()>::text("x"), Reader::text("y")]),
            Reader::text("z").optional(),
            Reader::text("w"),
        ]);
        match r.kind() {
            ReaderKind::Alternation(items) => assert_eq!(items.len(), 3),
            _ => panic!("expected an alternation"),
        }
        assert!(alternation::<()>([]).is_never());
    }

    #[test]
    fn test_repeat() {
        let r = repeat(Reader::text("ab"), 2, Some(3));
        assert_eq!(read(&r, "ab", 0), NO_MATCH);
        assert_eq!(read(&r, "abab", 0), 4);
        assert_eq!(read(&r, "abababab", 0), 6);
        let r = one_or_more(Reader::text("a"));
        assert_eq!(read(&r, "aaab", 0), 3);
        assert_eq!(read(&r, "b", 0), NO_MATCH);
        let r = zero_or_more(Reader::text("a"));
        assert_eq!(read(&r, "b", 0), 0);
    }

    #[test]
    fn test_repeat_non_advancing() {
        let r = repeat(Reader::text("a").optional(), 3, None);
        assert_eq!(read(&r, "aaab", 0), 3);
        assert_eq!(read(&r, "ab", 0), NO_MATCH);
        assert_eq!(read(&r, "b", 0), NO_MATCH);
        let r = repeat(lookahead(Reader::text("a")), 2, None);
        assert_eq!(read(&r, "a", 0), NO_MATCH);
        let r = zero_or_more(lookahead(Reader::text("a")));
        assert_eq!(read(&r, "a", 0), 0);
    }

    #[test]
    fn test_repeat_error() {
        let r = repeat(alternation([Reader::text("a"), fail_with(-3)]), 0, None);
        assert_eq!(read(&r, "aab", 0), -3);
    }

    #[test]
    fn test_repeat_degenerates() {
        let a = Reader::<()>::text("a");
        assert!(repeat(a.clone(), 1, Some(1)).ptr_eq(&a));
        assert!(matches!(
            repeat(a.clone(), 0, Some(1)).kind(),
            ReaderKind::Optional(_)
        ));
        assert!(repeat(a.clone(), 0, Some(0)).is_always());
        assert!(repeat(a, 3, Some(2)).is_never());
    }

    #[test]
    fn test_optional_never_fails() {
        let readers = [
            Reader::text("a"),
            Reader::never(),
            Reader::one_of("xyz"),
            sequence([Reader::text("a"), Reader::text("b")]),
        ];
        for reader in readers {
            let opt = optional(reader.clone());
            let rep = repeat(reader, 0, Some(1));
            for (text, offset) in [("ab", 0), ("x", 0), ("", 0), ("ba", 1)] {
                assert_ne!(read(&opt, text, offset), NO_MATCH);
                assert_eq!(read(&opt, text, offset), read(&rep, text, offset));
            }
        }
    }

    #[test]
    fn test_lookahead() {
        let r = lookahead(Reader::text("ab"));
        assert_eq!(read(&r, "xab", 1), 1);
        assert_eq!(read(&r, "xac", 1), NO_MATCH);
        let r = lookahead(fail_with(-2));
        assert_eq!(read(&r, "x", 0), -2);
    }

    #[test]
    fn test_until() {
        let r = until(Reader::text("*/"), false);
        assert_eq!(read(&r, "abc*/d", 0), 3);
        let r = until(Reader::text("*/"), true);
        assert_eq!(read(&r, "abc*/d", 0), 5);
        assert_eq!(read(&r, "abc", 0), NO_MATCH);
        let r = until_open(Reader::text("*/"), true);
        assert_eq!(read(&r, "abc", 0), 3);
        let r = until(Reader::end(), false);
        assert_eq!(read(&r, "abc", 1), 3);
        let r = until(alternation([Reader::text("z"), fail_with(-4)]), false);
        assert_eq!(read(&r, "abz", 0), -4);
    }
}
