//! Textual rendering of chains.
//!
//! The canonical form (`Display` for [`Chain`]) is a lossless nested-name
//! term, `Name` or `Name<Arg, ...>`, and is what artifacts persist. The
//! friendly form prints operands as signed decimals and is for people only.

use std::fmt;

use super::{Chain, Node, NodeKind};
use crate::operand::Operand;

/// Friendly rendering of a chain, see [`Chain::friendly`].
pub struct Friendly<'a>(&'a Chain);

impl Chain {
    /// Render with operands decoded to decimal, e.g. `AddData<3, Stop>`.
    pub fn friendly(&self) -> Friendly<'_> {
        Friendly(self)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_chain(f, self, false)
    }
}

impl fmt::Display for Friendly<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_chain(f, self.0, true)
    }
}

/// What is left to write: a whole chain, or a separator or closing bracket
/// of a node that is already open.
enum Piece<'a> {
    Chain(&'a Chain),
    Text(&'static str),
}

fn write_chain(f: &mut fmt::Formatter<'_>, chain: &Chain, friendly: bool) -> fmt::Result {
    let mut pieces = vec![Piece::Chain(chain)];
    while let Some(piece) = pieces.pop() {
        let chain = match piece {
            Piece::Text(text) => {
                f.write_str(text)?;
                continue;
            }
            Piece::Chain(chain) => chain,
        };
        let name = chain.kind().name();
        match chain.node() {
            Node::Stop => f.write_str(NodeKind::Stop.name())?,
            Node::Loop { body, next } => {
                write!(f, "{name}<")?;
                pieces.push(Piece::Text(">"));
                pieces.push(Piece::Chain(next));
                pieces.push(Piece::Text(", "));
                pieces.push(Piece::Chain(body));
            }
            Node::AddPointer { offset: operand, next } | Node::AddData { delta: operand, next } => {
                write!(f, "{name}<")?;
                write_operand(f, operand, friendly)?;
                f.write_str(", ")?;
                pieces.push(Piece::Text(">"));
                pieces.push(Piece::Chain(next));
            }
            Node::Output { next } | Node::Input { next } => {
                write!(f, "{name}<")?;
                pieces.push(Piece::Text(">"));
                pieces.push(Piece::Chain(next));
            }
        }
    }
    Ok(())
}

fn write_operand(f: &mut fmt::Formatter<'_>, operand: &Operand, friendly: bool) -> fmt::Result {
    if friendly {
        write!(f, "{}", operand.value())
    } else {
        write!(f, "{operand}")
    }
}

#[cfg(test)]
mod tests {
    use crate::chain::{Chain, Node};

    fn sample() -> Chain {
        // +[-<].
        let body = Chain::new(Node::AddData {
            delta: (-1).into(),
            next: Chain::new(Node::AddPointer { offset: (-1).into(), next: Chain::stop() }),
        });
        Chain::new(Node::AddData {
            delta: 1.into(),
            next: Chain::new(Node::Loop {
                body,
                next: Chain::new(Node::Output { next: Chain::stop() }),
            }),
        })
    }

    #[test]
    fn test_canonical_rendering() {
        let one = "Int<Hex0, Hex0, Hex0, Hex0, Hex0, Hex0, Hex0, Hex1>";
        let minus_one = "Int<HexF, HexF, HexF, HexF, HexF, HexF, HexF, HexF>";
        let expected = format!(
            "AddData<{one}, Loop<AddData<{minus_one}, AddPointer<{minus_one}, Stop>>, OutputData<Stop>>>"
        );
        assert_eq!(sample().to_string(), expected);
    }

    #[test]
    fn test_friendly_rendering() {
        assert_eq!(
            sample().friendly().to_string(),
            "AddData<1, Loop<AddData<-1, AddPointer<-1, Stop>>, OutputData<Stop>>>"
        );
        let input = Chain::new(Node::Input { next: Chain::stop() });
        assert_eq!(input.friendly().to_string(), "InputData<Stop>");
        assert_eq!(Chain::stop().to_string(), "Stop");
    }

    #[test]
    fn test_rendering_is_deterministic() {
        assert_eq!(sample().to_string(), sample().to_string());
    }

    #[test]
    fn test_long_chain_renders_without_deep_recursion() {
        let mut chain = Chain::stop();
        for _ in 0..200_000 {
            chain = Chain::new(Node::Output { next: chain });
        }
        let text = chain.to_string();
        assert!(text.starts_with("OutputData<OutputData<"));
        assert!(text.ends_with("Stop>>"));
        assert_eq!(text.len(), 200_000 * "OutputData<>".len() + "Stop".len());
        assert_eq!(chain.friendly().to_string(), text);
    }
}
