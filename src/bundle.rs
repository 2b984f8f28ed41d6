//! Standalone source bundles.
//!
//! A bundle is one Rust source file that needs nothing but std: the fixed
//! node and digit definitions from [`typed`](crate::typed), the canonical
//! rendering of the program as a type alias, and a `main` that runs it on
//! stdin/stdout. Compiling the bundle lets rustc monomorphize and inline the
//! whole chain into a single routine.
//!
//! # Size limit
//!
//! rustc resolves the program type by recursing through it, one level per
//! node. Bundles of a few hundred to a few thousand nodes build fine; past
//! [`PRACTICAL_NODE_LIMIT`] rustc tends to overflow its own stack (a 6k-node
//! program does). Larger programs are better served by the `.bfo` artifact or
//! the native object. Running rustc with a larger `RUST_MIN_STACK` can help.

use log::warn;

use crate::chain::Chain;

/// Chain length beyond which rustc is unlikely to build the bundle.
pub const PRACTICAL_NODE_LIMIT: usize = 4_000;

/// Fixed definitions every bundle starts from.
pub const DEFINITIONS: &str = crate::typed::DEFINITIONS;

const TEMPLATE: &str = r#"// Generated by brainfly. Build with: rustc -O <this file>
#![recursion_limit = "{{recursion_limit}}"]

{{definitions}}

type Program = {{program}};

fn main() {
    let mut tape = vec![0u8; {{memory_size}}];
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut input = stdin.lock();
    let mut output = std::io::BufWriter::new(stdout.lock());
    let code = match run::<Program>(&mut tape, &mut input, &mut output) {
        Ok(pointer) => pointer,
        Err(e) => {
            eprintln!("{}", e);
            1
        }
    };
    if let Err(e) = std::io::Write::flush(&mut output) {
        eprintln!("{}", e);
    }
    std::process::exit(code);
}
"#;

/// Fill the bundle template for `chain` with a tape of `memory_size` bytes.
pub fn render(chain: &Chain, memory_size: usize) -> String {
    let nodes = chain.len();
    if nodes > PRACTICAL_NODE_LIMIT {
        warn!("Bundling {nodes} nodes; rustc may overflow its stack past {PRACTICAL_NODE_LIMIT}");
    }
    // Type nesting grows with chain length; leave rustc headroom beyond it.
    let recursion_limit = (nodes + chain.depth() + 8).max(128) * 2;
    TEMPLATE
        .replace("{{recursion_limit}}", &recursion_limit.to_string())
        .replace("{{definitions}}", DEFINITIONS.trim_end())
        .replace("{{program}}", &chain.to_string())
        .replace("{{memory_size}}", &memory_size.to_string())
}
