/// Defines state that is built while walking one expansion of a [`crate::Spintax`].
///
/// This is implemented for
/// - `String` to produce the sentence
/// - `Vec<u8>` to produce the sentence as UTF-8 bytes
/// - `u64` to produce an identifier of the choices made. Two walks produce the same identifier
///   if and only if they picked the same alternatives (barring hash collisions), so the number of
///   distinct identifiers is bounded by [`crate::Spintax::count`].
/// - tuples of visitors, to build several of the above in one walk.
///
/// You can implement this yourself, for example to record which alternatives were picked.
pub trait Visitor {
    fn new() -> Self;
    /// Called when the `index`th alternative of a group is picked, before it is walked.
    fn visit_alternation(&mut self, _index: usize) {}
    fn visit_sequence(&mut self) {}
    fn visit_literal(&mut self, _s: &str) {}
}

/// Returns the expansion as a `String`.
impl Visitor for String {
    fn new() -> Self {
        Default::default()
    }
    fn visit_literal(&mut self, s: &str) {
        self.push_str(s);
    }
}

/// Returns the expansion as UTF-8 bytes.
impl Visitor for Vec<u8> {
    fn new() -> Self {
        Default::default()
    }
    fn visit_literal(&mut self, s: &str) {
        self.extend(s.as_bytes());
    }
}

fn id_hash(val: &mut u64, step: u64) {
    *val = fxhash::hash64(&(step, *val));
}

/// Returns an identifier of the alternatives picked during the walk.
impl Visitor for u64 {
    fn new() -> Self {
        u64::MAX
    }
    fn visit_alternation(&mut self, index: usize) {
        id_hash(self, fxhash::hash64(&(0, index as u64)))
    }
    fn visit_sequence(&mut self) {
        id_hash(self, 1)
    }
    fn visit_literal(&mut self, _: &str) {
        id_hash(self, 2)
    }
}

macro_rules! impl_visitor_tuple {
    ( $($name:ident)+) => (
        #[allow(non_snake_case)]
        impl<$($name: Visitor),+> Visitor for ($($name,)+) {
            fn new() -> ($($name,)+) {
                ($({ let x: $name = Visitor::new(); x},)+)
            }

            fn visit_alternation(&mut self, index: usize) {
                let ($(ref mut $name,)+) = *self;
                $($name.visit_alternation(index);)+
            }
            fn visit_sequence(&mut self) {
                let ($(ref mut $name,)+) = *self;
                $($name.visit_sequence();)+
            }
            fn visit_literal(&mut self, s: &str) {
                let ($(ref mut $name,)+) = *self;
                $($name.visit_literal(s);)+
            }
        }
    );
}

impl_visitor_tuple! { T }
impl_visitor_tuple! { T B }
impl_visitor_tuple! { T B C }
impl_visitor_tuple! { T B C D }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_and_bytes_agree() {
        let mut v = <(String, Vec<u8>)>::new();
        v.visit_sequence();
        v.visit_literal("spin");
        v.visit_alternation(1);
        v.visit_literal("täx");
        assert_eq!(v.0, "spintäx");
        assert_eq!(v.1, "spintäx".as_bytes());
    }

    #[test]
    fn ids_depend_on_choices() {
        let walk = |index| {
            let mut id = <u64 as Visitor>::new();
            id.visit_sequence();
            id.visit_alternation(index);
            id.visit_literal("ignored");
            id
        };
        assert_eq!(walk(0), walk(0));
        assert_ne!(walk(0), walk(1));
    }
}
