//! Tests for the persisted and native forms of a compiled program.

use std::fs;
use std::path::PathBuf;

use brainfly::artifact::{self, COMPRESSED_EXTENSION, TEXT_EXTENSION};
use brainfly::{bundle, compile, x64, CompileError, Executable};
use object::{File, Object, ObjectSection, ObjectSymbol};

const PROGRAM: &str = "++++++[>++++++++<-]>+.+.+.";

fn scratch_path(name: &str, extension: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("brainfly-{}-{name}", std::process::id()))
        .with_extension(extension)
}

fn output_of(exe: &Executable) -> Vec<u8> {
    let mut tape = [0u8; 128];
    let mut output = Vec::new();
    exe.run(&mut tape, &mut std::io::empty(), &mut output).unwrap();
    output
}

#[test]
fn test_compressed_artifact_survives_the_filesystem() {
    let exe = compile(PROGRAM).unwrap();
    let path = scratch_path("reload", COMPRESSED_EXTENSION);

    fs::write(&path, artifact::encode(exe.chain()).unwrap()).unwrap();
    assert!(artifact::is_compressed_artifact(&path));
    let bytes = fs::read(&path).unwrap();
    fs::remove_file(&path).unwrap();

    let reloaded = Executable::new(artifact::decode(&bytes).unwrap());
    assert_eq!(reloaded.chain(), exe.chain());
    assert_eq!(output_of(&reloaded), b"123");
}

#[test]
fn test_text_artifact_is_not_reloadable_as_compressed() {
    let path = scratch_path("text", TEXT_EXTENSION);
    assert!(!artifact::is_compressed_artifact(&path));

    let exe = compile(PROGRAM).unwrap();
    let err = artifact::decode(exe.friendly().to_string().as_bytes()).unwrap_err();
    assert!(matches!(err, CompileError::Codec(_)));
}

#[test]
fn test_corrupted_canonical_text_is_rejected() {
    let exe = compile(PROGRAM).unwrap();
    let mut text = exe.to_string();
    text.truncate(text.len() - 3);

    let compressed = artifact::compress(text.as_bytes()).unwrap();
    let err = artifact::decode(&compressed).unwrap_err();
    assert!(matches!(err, CompileError::MalformedArtifact { .. }));
}

#[test]
fn test_bundle_embeds_the_canonical_program() {
    let exe = compile(PROGRAM).unwrap();
    let source = bundle::render(exe.chain(), 4096);

    assert!(source.contains(&format!("type Program = {};", exe.chain())));
    assert!(source.contains("vec![0u8; 4096]"));
    assert!(source.contains("fn main()"));
}

#[test]
fn test_native_object_for_a_program() {
    let exe = compile(PROGRAM).unwrap();
    let code = x64::lower(exe.chain()).unwrap();
    let bytes = code.to_object().unwrap();

    let file = File::parse(&*bytes).unwrap();
    let text = file.section_by_name(".text").unwrap();
    assert_eq!(text.data().unwrap(), code.bytes());

    let symbol = file.symbol_by_name(x64::ENTRY_SYMBOL).unwrap();
    assert!(symbol.is_definition());
    assert_eq!(symbol.address(), 0);

    let listing = code.disassemble();
    assert_eq!(listing.lines().filter(|line| line.contains("call")).count(), 3);
}
