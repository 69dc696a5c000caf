use crate::error::{Error, Invariant};
use crate::node::{Node, NodeId, Nodes};
use crate::{parser, Visitor};

use arbitrary::Unstructured;
use rand::Rng;
use std::convert::Infallible;
use std::{fmt, str::FromStr};

/// One parsed record of spintax: a tree of literals, alternations (`{a|b}`) and sequences.
///
/// # Implementation
/// ## Construction
/// `Spintax` is built by [`crate::parse`] (or `from_str`), a single pass stack machine that
/// appends nodes to an arena as characters arrive. Once the record ends the tree is checked,
/// its number of combinations is computed, and it is never mutated again.
///
/// ## Sentence Generation
/// Generation walks the tree with an explicit stack starting at the root sequence. At every
/// alternation one alternative is picked, either from an [`Rng`] ([`Spintax::random`]) or from
/// [`Unstructured`] data ([`Spintax::expression`]), and literals are written to a [`Visitor`].
#[derive(Debug)]
pub struct Spintax {
    nodes: Nodes,

    // `count` calculated on construction.
    count: Option<u64>,
}

impl Spintax {
    pub(crate) fn new(nodes: Nodes) -> Result<Self, Error> {
        if nodes
            .iter()
            .any(|n| matches!(n, Node::Alternation(v) if v.is_empty()))
        {
            return Err(Error::internal(Invariant::EmptyAlternation));
        }
        let count = count(&nodes);
        Ok(Self { nodes, count })
    }

    /// Returns the number of distinct expansions of this tree, or
    /// `None` if the result exceeds `u64::MAX`.
    ///
    /// A literal counts as one, an alternation as the sum of its alternatives and a sequence
    /// as the product of its parts. Plain text therefore has exactly one expansion.
    ///
    /// # Limitations
    /// The result is not aware of duplicate outputs, e.g. `{foo|foo}` counts as 2 even
    /// though every expansion is "foo".
    pub fn count(&self) -> Option<u64> {
        self.count
    }

    /// Returns one expansion, picking every alternative uniformly at random with `rng`.
    ///
    /// Every call is an independent draw.
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        self.sample(rng)
    }

    /// Like [`Spintax::random`] but builds an arbitrary [`Visitor`].
    pub fn sample<V: Visitor, R: Rng + ?Sized>(&self, rng: &mut R) -> V {
        match self.walk::<V, Infallible>(|len| Ok(rng.random_range(0..len))) {
            Ok(v) => v,
            Err(e) => match e {},
        }
    }

    /// Returns a resulting `Visitor` after a walk whose choices are read from `u`.
    ///
    /// The same bytes always produce the same expansion, which makes this suitable as a
    /// fuzzing input generator.
    pub fn expression<V: Visitor>(&self, u: &mut Unstructured<'_>) -> arbitrary::Result<V> {
        self.walk(|len| u.choose_index(len))
    }

    fn walk<V: Visitor, E>(
        &self,
        mut choose: impl FnMut(usize) -> Result<usize, E>,
    ) -> Result<V, E> {
        let mut visitor = V::new();
        let mut to_write = vec![NodeId::ROOT];

        while let Some(id) = to_write.pop() {
            match self.nodes.get(id) {
                Node::Literal(s) => visitor.visit_literal(s),
                Node::Alternation(v) => {
                    let index = choose(v.len())?;
                    to_write.push(v[index]);
                    visitor.visit_alternation(index);
                }
                Node::Sequence(v) => {
                    to_write.extend(v.iter().rev());
                    visitor.visit_sequence();
                }
            }
        }
        Ok(visitor)
    }

    /// Reconstructs the notation this tree was parsed from.
    ///
    /// For balanced input this is the record itself; groups left open at the end of the record
    /// come back closed.
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Pretty prints the tree as nested `or(..)` and `concat(..)` calls.
    ///
    /// It's helpful to check that the parsed tree matches what is expected from the notation,
    /// since `render` hides where sequences were introduced.
    pub fn structure(&self) -> String {
        let mut out = String::new();
        // writing to a `String` cannot fail
        let _ = self.write_tree(&mut out, Style::Structure);
        out
    }

    fn write_tree(&self, f: &mut impl fmt::Write, style: Style) -> fmt::Result {
        let (open_or, open_concat, sep, close_or, close_concat) = match style {
            Style::Notation => ("{", "", "|", "}", ""),
            Style::Structure => ("or(", "concat(", ", ", ")", ")"),
        };

        let mut to_write = vec![Piece::Node(NodeId::ROOT)];
        while let Some(piece) = to_write.pop() {
            let (open, children, close, sep) = match piece {
                Piece::Str(s) => {
                    f.write_str(s)?;
                    continue;
                }
                Piece::Node(id) => match self.nodes.get(id) {
                    Node::Literal(s) => {
                        match style {
                            Style::Notation => f.write_str(s)?,
                            Style::Structure => write!(f, "{:?}", s)?,
                        }
                        continue;
                    }
                    Node::Alternation(v) => (open_or, v, close_or, sep),
                    Node::Sequence(v) => (
                        open_concat,
                        v,
                        close_concat,
                        if style == Style::Notation { "" } else { sep },
                    ),
                },
            };

            to_write.push(Piece::Str(close));
            for (i, child) in children.iter().enumerate().rev() {
                to_write.push(Piece::Node(*child));
                if i > 0 {
                    to_write.push(Piece::Str(sep));
                }
            }
            to_write.push(Piece::Str(open));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Notation,
    Structure,
}

enum Piece {
    Node(NodeId),
    Str(&'static str),
}

fn add(x: Option<u64>, y: Option<u64>) -> Option<u64> {
    x?.checked_add(y?)
}

fn mul(x: Option<u64>, y: Option<u64>) -> Option<u64> {
    x?.checked_mul(y?)
}

/// Bottom up count of the tree rooted at [`NodeId::ROOT`].
///
/// Children are entered before their parent is folded, so `counts` holds exactly the results of
/// a parent's children (in order) when its `Sum` or `Product` step is popped.
fn count(nodes: &Nodes) -> Option<u64> {
    enum Step {
        Enter(NodeId),
        Sum(usize),
        Product(usize),
    }

    let mut counts: Vec<Option<u64>> = Vec::new();
    let mut steps = vec![Step::Enter(NodeId::ROOT)];
    while let Some(step) = steps.pop() {
        match step {
            Step::Enter(id) => match nodes.get(id) {
                Node::Literal(_) => counts.push(Some(1)),
                Node::Alternation(v) => {
                    steps.push(Step::Sum(v.len()));
                    steps.extend(v.iter().map(|&c| Step::Enter(c)));
                }
                Node::Sequence(v) => {
                    steps.push(Step::Product(v.len()));
                    steps.extend(v.iter().map(|&c| Step::Enter(c)));
                }
            },
            Step::Sum(n) => {
                let res = counts.drain(counts.len() - n..).fold(Some(0), add);
                counts.push(res);
            }
            Step::Product(n) => {
                let res = counts.drain(counts.len() - n..).fold(Some(1), mul);
                counts.push(res);
            }
        }
    }
    counts.pop().flatten()
}

/// Prints the tree back in `{a|b}` notation.
impl fmt::Display for Spintax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        self.write_tree(f, Style::Notation)
    }
}

/// Parses the first record of the string; anything after the first line terminator is ignored.
impl FromStr for Spintax {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parser::parse(&mut s.chars())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, RngCore, SeedableRng};
    use std::collections::HashSet;
    use std::hash::Hash;

    fn tree(s: &str) -> Spintax {
        s.parse().unwrap()
    }

    #[test]
    fn counts() {
        assert_eq!(tree("{a|b}").count(), Some(2));
        assert_eq!(tree("{a|b}{c|d}").count(), Some(4));
        assert_eq!(tree("{a|b|c}").count(), Some(3));
        assert_eq!(tree("{{a|b}|c}").count(), Some(3));
        assert_eq!(tree("{|b}").count(), Some(2));
        assert_eq!(tree("hello").count(), Some(1));
        assert_eq!(tree("").count(), Some(1));

        // 2 * (2 + 1)
        assert_eq!(tree("{a|b} {c{d|e}|f}").count(), Some(6));
        // (1 * (2 + 1)) + 1 in the outer group
        assert_eq!(tree("a{b{c|d}|e}").count(), Some(3));
    }

    #[test]
    fn count_overflow() {
        // 2^64 combinations
        let s = "{a|b}".repeat(64);
        assert_eq!(tree(&s).count(), None);

        let s = "{a|b}".repeat(63);
        assert_eq!(tree(&s).count(), Some(1 << 63));

        // an overflowing branch poisons the sum too
        let s = format!("{{x|{}}}", "{a|b}".repeat(64));
        assert_eq!(tree(&s).count(), None);
    }

    #[test]
    fn renders() {
        for s in [
            "hello",
            "",
            "{a|b}",
            "{a|b}{c|d}",
            "The {quick|slow} fox.",
            "{|b}",
            "{a|}",
            "{a||b}",
            "{}",
            "a|b}",
            "{{a|b}|c}",
            "a{b{c|d}|e}",
            "{x{a|b}y{c|d}|z} tail",
        ] {
            assert_eq!(tree(s).render(), s);
            assert_eq!(tree(s).to_string(), s);
        }
        assert_eq!(tree("{a|{b|c").render(), "{a|{b|c}}");
    }

    #[test]
    fn literal_is_fixed() {
        let t = tree("hello");
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            assert_eq!(t.random(&mut rng), "hello");
        }
    }

    #[test]
    fn random_picks_every_alternative() {
        let t = tree("{a|b}");
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let s = t.random(&mut rng);
            assert!(s == "a" || s == "b", "{}", s);
            seen.insert(s);
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn random_is_roughly_uniform() {
        let t = tree("{a|b|c|d}");
        let mut rng = StdRng::seed_from_u64(7);
        let mut hits = [0usize; 4];
        for _ in 0..4000 {
            let s = t.random(&mut rng);
            hits[(s.as_bytes()[0] - b'a') as usize] += 1;
        }
        for h in hits {
            assert!((800..1200).contains(&h), "{:?}", hits);
        }
    }

    #[test]
    fn empty_alternative_expands_to_nothing() {
        let t = tree("x{|b}y");
        let mut rng = StdRng::seed_from_u64(1);
        let seen: HashSet<String> = (0..500).map(|_| t.random(&mut rng)).collect();
        assert_eq!(seen, ["xy".to_string(), "xby".to_string()].into());
    }

    #[test]
    fn seeded_rng_is_repeatable() {
        let t = tree("{a|b|c}{d|e|f}{g|h|i}");
        let draw = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..20).map(|_| t.random(&mut rng)).collect::<Vec<_>>()
        };
        assert_eq!(draw(3), draw(3));
    }

    fn assert_count_matches_generations<T: Visitor + Hash + Eq>(t: &Spintax) {
        let mut buf = [0u8; 1024];
        let num_classes = t.count().expect("small number of classes") as usize;
        assert!(num_classes < 10_000);
        let mut classes = HashSet::<T>::with_capacity(num_classes);

        let mut rng = StdRng::seed_from_u64(42);

        // alternatives are not equally likely across nesting levels,
        // 400 draws per class is plenty for these trees
        let num_iterations = 400 * num_classes;

        for _ in 0..num_iterations {
            rng.fill_bytes(&mut buf);
            let mut u = Unstructured::new(&buf);
            classes.insert(t.expression::<T>(&mut u).unwrap());
        }
        assert_eq!(classes.len(), num_classes);
    }

    #[test]
    fn count_matches_generations() {
        for s in [
            "{a|b}",
            "{a|b}{c|d}",
            "{{a|b}|c}",
            "a{b{c|d}|e}",
            "{x{a|b}y{c|d}|z}",
            "{The|A} {quick|slow{er|est}|} fox {jumps|leaps {over|past}}",
        ] {
            let t = tree(s);
            assert_count_matches_generations::<u64>(&t);
            assert_count_matches_generations::<String>(&t);
        }
    }

    #[test]
    fn expression_is_deterministic() {
        let t = tree("{a|b|c}{d|e|f}{g|h|i}");
        let seed = b"qwertyqwertyqwerty";
        let mut u = Unstructured::new(seed);
        let (sentence_old, id_old): (String, u64) = t.expression(&mut u).unwrap();
        for _ in 0..10 {
            let mut u = Unstructured::new(seed);
            let (sentence, id): (String, u64) = t.expression(&mut u).unwrap();
            assert_eq!(sentence, sentence_old);
            assert_eq!(id, id_old);
        }
    }

    #[test]
    fn deep_nesting_does_not_recurse() {
        let depth = 100_000;
        let s = format!("{}x{}", "{".repeat(depth), "}".repeat(depth));
        let t = tree(&s);
        assert_eq!(t.count(), Some(1));
        assert_eq!(t.render(), s);
        assert_eq!(t.random(&mut StdRng::seed_from_u64(0)), "x");
    }

    #[test]
    fn is_send_and_sync() {
        fn check<T: Send + Sync>() {}
        check::<Spintax>();
    }
}
