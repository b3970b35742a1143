//! The raw command accumulator.
//!
//! A [`RawCommand`] is an ordered list of fragments: literal text,
//! identifiers (escaped by the dialect at finalization time, not
//! before), and bind values. Adjacent text fragments are merged after
//! every append, so two builders fed the same logical content in
//! different call sequences hold identical fragment lists.

use duetdb_model::Value;

/// One component of a raw command.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Literal command text.
    Text(String),
    /// An identifier, escaped by the dialect during finalization.
    Identifier(String),
    /// A bind value, sent out-of-band from the command text.
    Bind(Value),
}

/// An accumulator of command fragments.
///
/// Builders are per-call local state; nothing here is shared or locked.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawCommand {
    fragments: Vec<Fragment>,
}

impl RawCommand {
    /// Create an empty command.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a command from a single text fragment.
    pub fn text(text: impl Into<String>) -> Self {
        let mut command = Self::new();
        command.append_text(text);
        command
    }

    /// Create a command from raw fragments, normalizing adjacent text.
    pub fn from_fragments(fragments: Vec<Fragment>) -> Self {
        let mut command = Self::new();
        for fragment in fragments {
            match fragment {
                Fragment::Text(text) => command.append_text(text),
                Fragment::Identifier(name) => command.append_identifier(name),
                Fragment::Bind(value) => command.append_bind(value),
            }
        }
        command
    }

    /// Append literal text, merging into a trailing text fragment.
    pub fn append_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        match self.fragments.last_mut() {
            Some(Fragment::Text(existing)) => existing.push_str(&text),
            _ => self.fragments.push(Fragment::Text(text)),
        }
    }

    /// Append every fragment of another command.
    pub fn append_command(&mut self, other: RawCommand) {
        for fragment in other.fragments {
            match fragment {
                Fragment::Text(text) => self.append_text(text),
                other => self.fragments.push(other),
            }
        }
    }

    /// Append a bind value.
    pub fn append_bind(&mut self, value: impl Into<Value>) {
        self.fragments.push(Fragment::Bind(value.into()));
    }

    /// Append a single identifier.
    pub fn append_identifier(&mut self, name: impl Into<String>) {
        self.fragments.push(Fragment::Identifier(name.into()));
    }

    /// Append a possibly schema-qualified identifier.
    ///
    /// `schema.name` splits into an identifier, a literal `.`, and a
    /// second identifier, each escaped independently so dialect quoting
    /// never covers the separator.
    pub fn append_qualified_identifier(&mut self, name: &str) {
        let mut first = true;
        for part in name.split('.') {
            if !first {
                self.append_text(".");
            }
            self.append_identifier(part);
            first = false;
        }
    }

    /// Merge adjacent text fragments. Appends already maintain this
    /// invariant; running it again is a no-op.
    pub fn simplify(&mut self) {
        let fragments = std::mem::take(&mut self.fragments);
        for fragment in fragments {
            match fragment {
                Fragment::Text(text) => self.append_text(text),
                other => self.fragments.push(other),
            }
        }
    }

    /// The normalized fragment list.
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Check if the command holds no fragments.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Iterate over the bind values in fragment order.
    pub fn bind_values(&self) -> impl Iterator<Item = &Value> {
        self.fragments.iter().filter_map(|fragment| match fragment {
            Fragment::Bind(value) => Some(value),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_adjacent_text_merges() {
        let mut command = RawCommand::new();
        command.append_text("SELECT ");
        command.append_text("* FROM ");
        command.append_identifier("users");

        assert_eq!(
            command.fragments(),
            &[
                Fragment::Text("SELECT * FROM ".into()),
                Fragment::Identifier("users".into()),
            ]
        );
    }

    #[test]
    fn test_construction_order_does_not_matter() {
        let mut a = RawCommand::new();
        a.append_text("WHERE ");
        a.append_text("x = ");
        a.append_bind(1i64);

        let mut b = RawCommand::new();
        b.append_text("WHERE x = ");
        b.append_bind(1i64);

        assert_eq!(a, b);
    }

    #[test]
    fn test_append_command_merges_boundary() {
        let mut left = RawCommand::text("a = ");
        let mut right = RawCommand::new();
        right.append_bind(1i64);
        right.append_text(" AND ");
        left.append_command(right);
        left.append_command(RawCommand::text("b = 2"));

        assert_eq!(
            left.fragments(),
            &[
                Fragment::Text("a = ".into()),
                Fragment::Bind(Value::Int(1)),
                Fragment::Text(" AND b = 2".into()),
            ]
        );
    }

    #[test]
    fn test_simplify_is_idempotent() {
        let mut command = RawCommand::from_fragments(vec![
            Fragment::Text("a".into()),
            Fragment::Text("b".into()),
            Fragment::Bind(Value::Int(1)),
            Fragment::Text("c".into()),
            Fragment::Text("".into()),
            Fragment::Text("d".into()),
        ]);

        let once = command.clone();
        command.simplify();
        assert_eq!(command, once);

        assert_eq!(
            command.fragments(),
            &[
                Fragment::Text("ab".into()),
                Fragment::Bind(Value::Int(1)),
                Fragment::Text("cd".into()),
            ]
        );
    }

    #[test]
    fn test_qualified_identifier_splits_on_dot() {
        let mut command = RawCommand::new();
        command.append_qualified_identifier("public.users");

        assert_eq!(
            command.fragments(),
            &[
                Fragment::Identifier("public".into()),
                Fragment::Text(".".into()),
                Fragment::Identifier("users".into()),
            ]
        );
    }

    #[test]
    fn test_unqualified_identifier_is_single_fragment() {
        let mut command = RawCommand::new();
        command.append_qualified_identifier("users");
        assert_eq!(command.fragments(), &[Fragment::Identifier("users".into())]);
    }

    #[test]
    fn test_bind_values_iteration() {
        let mut command = RawCommand::text("x IN (");
        command.append_bind(1i64);
        command.append_text(", ");
        command.append_bind(2i64);
        command.append_text(")");

        let binds: Vec<_> = command.bind_values().collect();
        assert_eq!(binds, vec![&Value::Int(1), &Value::Int(2)]);
    }
}
