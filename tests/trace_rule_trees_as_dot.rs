// Outputs the rule tries of all stages in dot format.
// Run with `cargo test -- --nocapture trace_rule_trees_as_dot`

use streamlex::{sequence, Reader, Rule, TokenizerBuilder};

#[test]
fn trace_rule_trees_as_dot() {
    // Initialize the logger
    let _ = env_logger::builder()
        .is_test(true)
        .parse_env(env_logger::Env::default().default_filter_or("streamlex::tokenizer=debug"))
        .try_init();

    let quote: Reader<()> = Reader::text("\"");
    let ident = Reader::regex(r"[a-zA-Z_]\w*").unwrap();
    let keyword = sequence([Reader::text("let"), Reader::one_of(" \t")]);
    let tokenizer = TokenizerBuilder::new()
        .add_rule(Rule::new("Keyword", keyword).on(["Code"]))
        .add_rule(Rule::new("Call", sequence([ident.clone(), Reader::text("(")])).on(["Code"]))
        .add_rule(Rule::new("Ident", ident).on(["Code"]))
        .add_rule(Rule::new("Quote", quote.clone()).on(["Code"]).to("String"))
        .add_rule(
            Rule::new("Escape", sequence([Reader::text("\\"), Reader::skip(1)])).on(["String"]),
        )
        .add_rule(Rule::new("Chars", Reader::none_of("\"\\").one_or_more()).on(["String"]))
        .add_rule(Rule::new("EndQuote", quote).on(["String"]).to("Code"))
        .add_rule(Rule::new("Whitespace", Reader::one_of(" \t\r\n").one_or_more()))
        .initial_stage("Code")
        .build()
        .unwrap();

    tokenizer
        .log_rule_trees_as_dot()
        .expect("Failed to trace rule trees as dot");

    let folder = tempfile::tempdir().unwrap();
    tokenizer
        .generate_rule_trees_as_dot(folder.path())
        .expect("Failed to write rule trees as dot");
    let code = std::fs::read_to_string(folder.path().join("Code.dot")).unwrap();
    // "Call" and "Ident" share the identifier branch.
    assert!(code.contains("rule 2"));
    println!("{}", code);
}
