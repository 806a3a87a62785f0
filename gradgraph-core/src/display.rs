use crate::error::GradGraphError;
use crate::graph::{Graph, NodeId};
use crate::numeric::GraphFloat;
use crate::ops::OpKind;

/// Expressions longer than this are cut and end with `...`.
pub const MAX_EXPRESSION_LEN: usize = 4096;

enum Piece {
    Node(usize),
    Text(&'static str),
    Owned(String),
}

impl<T: GraphFloat> Graph<T> {
    /// Renders the expression computing `id` in infix form.
    ///
    /// Built on demand by walking the arena; nothing is stored while the
    /// graph is constructed. Named inner nodes print their name instead of
    /// being expanded, unnamed leaves print as `n<index>`. Shared
    /// sub-expressions are repeated at every use, so the output is capped at
    /// [`MAX_EXPRESSION_LEN`] bytes.
    pub fn expression(&self, id: NodeId) -> Result<String, GradGraphError> {
        let root = self.resolve(id)?;
        let mut out = String::new();
        let mut stack = Vec::new();
        self.expand(root, &mut stack);

        while let Some(piece) = stack.pop() {
            if out.len() > MAX_EXPRESSION_LEN {
                let mut cut = MAX_EXPRESSION_LEN;
                while !out.is_char_boundary(cut) {
                    cut -= 1;
                }
                out.truncate(cut);
                out.push_str("...");
                break;
            }
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Owned(text) => out.push_str(&text),
                Piece::Node(index) => match &self.meta[index].name {
                    Some(name) => out.push_str(name),
                    None if self.meta[index].op.is_leaf() => {
                        out.push_str(&format!("n{}", index))
                    }
                    None => self.expand(index, &mut stack),
                },
            }
        }
        Ok(out)
    }

    /// Pushes the pieces of one node in reverse, so popping emits them in
    /// reading order.
    fn expand(&self, index: usize, stack: &mut Vec<Piece>) {
        let op = &self.meta[index].op;
        let ids: Vec<usize> = op.operands.as_slice().iter().map(|o| o.index()).collect();
        let mut pieces: Vec<Piece> = Vec::new();

        let infix = |symbol: &'static str, pieces: &mut Vec<Piece>| {
            pieces.extend([
                Piece::Text("("),
                Piece::Node(ids[0]),
                Piece::Text(symbol),
                Piece::Node(ids[1]),
                Piece::Text(")"),
            ]);
        };
        let call = |name: &'static str, pieces: &mut Vec<Piece>| {
            pieces.push(Piece::Text(name));
            pieces.push(Piece::Text("("));
            for (k, &operand) in ids.iter().enumerate() {
                if k > 0 {
                    pieces.push(Piece::Text(", "));
                }
                pieces.push(Piece::Node(operand));
            }
            pieces.push(Piece::Text(")"));
        };

        match op.kind {
            OpKind::Leaf => pieces.push(match &self.meta[index].name {
                Some(name) => Piece::Owned(name.clone()),
                None => Piece::Owned(format!("n{}", index)),
            }),
            OpKind::Add => infix(" + ", &mut pieces),
            OpKind::Sub => infix(" - ", &mut pieces),
            OpKind::Mul => infix(" * ", &mut pieces),
            OpKind::Div => infix(" / ", &mut pieces),
            OpKind::Scale => infix(" * ", &mut pieces),
            OpKind::MatVec | OpKind::MatMul => infix(" @ ", &mut pieces),
            OpKind::Neg => {
                pieces.extend([Piece::Text("-("), Piece::Node(ids[0]), Piece::Text(")")])
            }
            OpKind::Element(i) => pieces.extend([
                Piece::Node(ids[0]),
                Piece::Owned(format!("[{}]", i)),
            ]),
            OpKind::Row(i) => pieces.extend([
                Piece::Node(ids[0]),
                Piece::Owned(format!("[{}, :]", i)),
            ]),
            kind => call(kind.name(), &mut pieces),
        }

        stack.extend(pieces.into_iter().rev());
    }
}
