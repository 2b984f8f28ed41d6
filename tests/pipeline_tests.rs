//! End-to-end tests: source text through parsing, lowering, binding and running.

use std::io;

use brainfly::{
    compile, reconstruct, CompilationSession, CompileError, Executable, Outcome,
};
use brainfly::core::UnbalancedBracket;
use bumpalo::Bump;

const HELLO_WORLD: &str = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";

/// Run `exe` on a fresh tape and return the final pointer with the output.
fn run_with(exe: &Executable, memory: usize, input: &[u8]) -> (i32, Vec<u8>) {
    let mut tape = vec![0u8; memory];
    let mut output = Vec::new();
    let pointer = exe
        .run(&mut tape, &mut &input[..], &mut output)
        .unwrap_or_else(|e| panic!("run failed: {e}"));
    (pointer, output)
}

fn expect_malformed(source: &str) -> (UnbalancedBracket, usize) {
    match compile(source) {
        Err(CompileError::MalformedProgram { reason, position }) => (reason, position),
        Err(e) => panic!("expected a bracket error for {source:?}, got {e}"),
        Ok(_) => panic!("expected a bracket error for {source:?}"),
    }
}

#[test]
fn test_hello_world() {
    let exe = compile(HELLO_WORLD).unwrap();
    let (pointer, output) = run_with(&exe, 128, b"");
    assert_eq!(output, b"Hello World!\n");
    assert_eq!(pointer, 6);
}

#[test]
fn test_echo_until_input_runs_out() {
    let exe = compile(",[.,]").unwrap();
    let (pointer, output) = run_with(&exe, 128, b"brainfly");
    assert_eq!(output, b"brainfly");
    assert_eq!(pointer, 0);
}

#[test]
fn test_read_on_empty_input_halts_before_output() {
    let exe = compile(",.").unwrap();
    let mut tape = [0u8; 128];
    let mut output = Vec::new();
    let outcome = exe.execute(&mut tape, &mut io::empty(), &mut output).unwrap();
    assert_eq!(outcome, Outcome::InputExhausted(0));
    assert!(outcome.is_halted());
    assert!(output.is_empty());
}

#[test]
fn test_empty_and_comment_only_programs() {
    for source in ["", "this is only a comment"] {
        let exe = compile(source).unwrap();
        assert_eq!(exe.chain().to_string(), "Stop");
        assert_eq!(run_with(&exe, 128, b""), (0, Vec::new()));
    }
}

#[test]
fn test_final_pointer_is_reported() {
    let exe = compile(">>>+<").unwrap();
    let (pointer, _) = run_with(&exe, 128, b"");
    assert_eq!(pointer, 2);
}

#[test]
fn test_bracket_errors() {
    assert_eq!(expect_malformed("]"), (UnbalancedBracket::UnmatchedClose, 0));
    assert_eq!(expect_malformed("+[-]]"), (UnbalancedBracket::UnmatchedClose, 4));
    assert_eq!(expect_malformed("["), (UnbalancedBracket::UnterminatedLoop, 0));
    assert_eq!(expect_malformed("[+[-"), (UnbalancedBracket::UnterminatedLoop, 2));

    let err = compile("[[]").unwrap_err();
    assert!(err.is_malformed_program());
    assert!(err.to_string().contains("character 0"));
}

#[test]
fn test_reconstructed_chain_runs_identically() {
    let programs = [
        HELLO_WORLD,
        ",[.,]",
        "++[>+++<-]>[-<+>]<.",
        ">>>+++[<<+>>-]<<[->+<]>.",
        "+[[-]]",
    ];
    for source in programs {
        let exe = compile(source).unwrap();
        let text = exe.to_string();
        let reloaded = Executable::from_artifact(&text).unwrap();

        assert_eq!(reloaded.chain(), exe.chain(), "{source}");
        assert_eq!(reloaded.to_string(), text);
        assert_eq!(
            run_with(&reloaded, 256, b"round trip"),
            run_with(&exe, 256, b"round trip"),
            "{source}"
        );
    }
}

#[test]
fn test_reconstruct_rejects_unknown_names() {
    let err = reconstruct("AddData<Int<Hex0, Hex0, Hex0, Hex0, Hex0, Hex0, Hex0, Hex1>, Halt>")
        .unwrap_err();
    assert!(matches!(err, CompileError::UnknownSymbol { ref name } if name == "Halt"));
}

#[test]
fn test_executables_are_independent() {
    let arena = Bump::new();
    let session = CompilationSession::new(&arena);
    let add = session.compile("+++.").unwrap();
    let echo = session.compile(",.").unwrap();

    assert_eq!(run_with(&add, 128, b"").1, vec![3]);
    assert_eq!(run_with(&echo, 128, b"x").1, b"x");
    // Running the others must not disturb an already bound executable.
    assert_eq!(run_with(&add, 128, b"").1, vec![3]);
    assert!(add.is_bound());
    assert!(echo.is_bound());

    let stats = session.stats();
    assert_eq!(stats.programs_parsed, 2);
    assert_eq!(stats.chains_lowered, 2);
}

#[test]
fn test_session_shares_identical_subchains() {
    let arena = Bump::new();
    let session = CompilationSession::new(&arena);
    let first = session.compile("[-]>[-]").unwrap();
    let second = session.compile("[-]>[-]").unwrap();

    assert!(first.chain().ptr_eq(second.chain()));
    assert!(session.stats().nodes_reused > 0);
}

#[test]
fn test_cell_arithmetic_wraps() {
    let exe = compile("-.+.").unwrap();
    assert_eq!(run_with(&exe, 128, b"").1, vec![255, 0]);

    // 256 increments are a net zero delta.
    let exe = compile(&"+".repeat(256)).unwrap();
    assert_eq!(run_with(&exe, 128, b"").1, Vec::<u8>::new());
}

#[test]
fn test_friendly_rendering_shows_values() {
    let exe = compile("+++[>++<-]").unwrap();
    assert_eq!(
        exe.friendly().to_string(),
        "AddData<3, Loop<AddPointer<1, AddData<2, AddPointer<-1, AddData<-1, Stop>>>>, Stop>>"
    );
}
