/// The state of one token stream.
///
/// The state is plain data owned by the caller. It can be snapshotted (with the `serde` feature
/// enabled) and resumed later, also by another tokenizer built from the same rules.
///
/// Invariant: `offset <= chunk.len()`; the absolute position of the next unconsumed code unit is
/// `chunk_offset + offset`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct State {
    /// The active stage. `None` is the stage-less state.
    pub stage: Option<String>,
    /// The text not yet consumed, possibly preceded by already consumed text.
    pub chunk: Vec<u8>,
    /// The cursor within `chunk`.
    pub offset: usize,
    /// The absolute offset of the start of `chunk` in the stream.
    pub chunk_offset: usize,
}

impl State {
    /// Creates a fresh state at the start of a stream.
    pub fn new(stage: Option<String>) -> Self {
        Self {
            stage,
            chunk: Vec::new(),
            offset: 0,
            chunk_offset: 0,
        }
    }

    /// The absolute position of the next unconsumed code unit.
    #[inline]
    pub fn position(&self) -> usize {
        self.chunk_offset + self.offset
    }

    /// The unconsumed text.
    #[inline]
    pub fn remaining(&self) -> &[u8] {
        &self.chunk[self.offset..]
    }

    /// Drops the consumed prefix of the chunk and appends `chunk`.
    ///
    /// [`crate::Tokenizer::write`] does this before scanning. Callers driving an emitted scanning
    /// routine (see [`crate::generate`]) append each chunk themselves.
    pub fn append(&mut self, chunk: &[u8]) {
        if self.offset > 0 {
            self.chunk.drain(..self.offset);
            self.chunk_offset += self.offset;
            self.offset = 0;
        }
        self.chunk.extend_from_slice(chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append() {
        let mut state = State::new(Some("S1".to_string()));
        state.append(b"hello ");
        state.offset = 4;
        state.append(b"world");
        assert_eq!(state.chunk, b"o world");
        assert_eq!(state.offset, 0);
        assert_eq!(state.chunk_offset, 4);
        assert_eq!(state.position(), 4);
        assert_eq!(state.remaining(), b"o world");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_state_serialization() {
        let state = State {
            stage: Some("S2".to_string()),
            chunk: b"ab".to_vec(),
            offset: 1,
            chunk_offset: 7,
        };
        let serialized = serde_json::to_string(&state).unwrap();
        assert_eq!(
            serialized,
            r#"{"stage":"S2","chunk":[97,98],"offset":1,"chunkOffset":7}"#
        );
        let deserialized: State = serde_json::from_str(&serialized).unwrap();
        assert_eq!(state, deserialized);
    }
}
