// Runs the emitted scanning routines side by side with the tokenizer they were emitted from.
// Run with `cargo test -p streamlex_emitted`

use rstest::rstest;
use streamlex::{Event, Rule, State, Tokenizer};
use streamlex_emitted::{json_scanner, json_scanner_factory, lexemes};

type Events = Vec<Event<&'static str>>;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn tokenizer() -> Tokenizer<&'static str> {
    lexemes::tokenizer().unwrap()
}

fn fresh_state() -> State {
    State::new(Some(lexemes::VALUE.to_string()))
}

fn interpreted(tokenizer: &Tokenizer<&'static str>, chunks: &[&[u8]]) -> (Events, State) {
    let mut events = Events::new();
    let mut state = Some(fresh_state());
    for chunk in chunks {
        state = Some(tokenizer.write(chunk, state, &mut events, &()));
    }
    let state = tokenizer.end(state.unwrap_or_default(), &mut events, &());
    (events, state)
}

fn emitted(rules: &[Rule<&'static str>], chunks: &[&[u8]]) -> (Events, State) {
    let mut events = Events::new();
    let mut state = fresh_state();
    for chunk in chunks {
        state.append(chunk);
        json_scanner::scan(rules, &mut state, &mut events, &(), true);
    }
    json_scanner::scan(rules, &mut state, &mut events, &(), false);
    (events, state)
}

/// The text split at every position, plus the text split into single code units.
fn chunkings(text: &[u8]) -> Vec<Vec<&[u8]>> {
    let mut chunkings = vec![vec![text]];
    for split in 0..=text.len() {
        chunkings.push(vec![&text[..split], &text[split..]]);
    }
    chunkings.push(text.chunks(1).collect());
    chunkings
}

#[rstest]
#[case::object(r#"{"key": [1, -2.5e3, true], "s": "a\"b\\c"}"#)]
#[case::literals("[null, false, /* note */ 12, 0.5]")]
#[case::invalid_escape(r#"["ok", "bad \q escape", 1]"#)]
#[case::unrecognized("[1, @]")]
#[case::unterminated_string(r#"["abc"#)]
#[case::unterminated_comment("[1 /* open")]
#[case::empty("")]
fn emitted_routine_matches_tokenizer(#[case] text: &str) {
    init();
    let tokenizer = tokenizer();
    for chunks in chunkings(text.as_bytes()) {
        let expected = interpreted(&tokenizer, &chunks);
        let actual = emitted(tokenizer.rules(), &chunks);
        assert_eq!(actual, expected, "chunks {:?}", chunks);
    }
}

#[test]
fn emitted_routine_reports_tokens_and_errors() {
    init();
    let tokenizer = tokenizer();
    let mut events = Events::new();
    let mut state = fresh_state();
    state.append(br#"["a\q"]"#);
    json_scanner::scan(tokenizer.rules(), &mut state, &mut events, &(), false);
    assert_eq!(
        events,
        [
            Event::token("LBracket", 0, 1),
            Event::token("Quote", 1, 2),
            Event::token("Chars", 2, 3),
            Event::Error {
                token_type: "Escape",
                offset: 3,
                code: lexemes::INVALID_ESCAPE,
            },
        ]
    );
    assert_eq!(state.position(), 3);
    assert_eq!(state.stage.as_deref(), Some(lexemes::STRING));
    // Resuming reports the same error again.
    json_scanner::scan(tokenizer.rules(), &mut state, &mut events, &(), false);
    assert_eq!(events.len(), 5);
    assert_eq!(events[4], events[3]);
}

#[test]
fn factory_routine_matches_tokenizer() {
    init();
    let tokenizer = tokenizer();
    let readers = tokenizer.bound_readers();
    assert_eq!(readers.len(), 2);
    let scan = json_scanner_factory::scan::<&'static str, (), Events>(&readers);

    let text = br#"{"n": [1, 2.5], "s": "x\ny" /* c */}"#;
    for chunks in chunkings(text) {
        let expected = interpreted(&tokenizer, &chunks);
        let mut events = Events::new();
        let mut state = fresh_state();
        for chunk in &chunks {
            state.append(chunk);
            scan(tokenizer.rules(), &mut state, &mut events, &(), true);
        }
        scan(tokenizer.rules(), &mut state, &mut events, &(), false);
        assert_eq!((events, state), expected, "chunks {:?}", chunks);
    }
}
