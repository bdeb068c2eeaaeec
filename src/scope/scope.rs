use thiserror::Error;

/// One declarative region: the names declared in it, in declaration order,
/// plus whatever the region is tagged with (the owning procedure for variables).
#[derive(Debug)]
pub struct Scope<V, E> {
    pub extra: E,
    entries: Vec<(String, V)>,
}

impl<V, E> Scope<V, E> {
    fn new(extra: E) -> Self {
        Scope {
            extra,
            entries: vec![],
        }
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScopeError {
    #[error("no scope is open")]
    NoScope,
    #[error("{0:?} is already declared in this scope")]
    Duplicate(String),
}

/// A stack of scopes. Lookups go innermost first.
#[derive(Debug)]
pub struct ScopedTable<V, E = ()> {
    scopes: Vec<Scope<V, E>>,
}

impl<V, E> Default for ScopedTable<V, E> {
    fn default() -> Self {
        ScopedTable { scopes: vec![] }
    }
}

impl<V, E> ScopedTable<V, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, extra: E) {
        self.scopes.push(Scope::new(extra));
    }

    pub fn pop(&mut self) -> Option<Scope<V, E>> {
        self.scopes.pop()
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn current(&self) -> Option<&Scope<V, E>> {
        self.scopes.last()
    }

    pub fn declare(&mut self, name: &str, value: V) -> Result<(), ScopeError> {
        let scope = self.scopes.last_mut().ok_or(ScopeError::NoScope)?;
        if scope.get(name).is_some() {
            return Err(ScopeError::Duplicate(name.to_string()));
        }

        scope.entries.push((name.to_string(), value));
        Ok(())
    }

    /// Finds `name` in the innermost scope declaring it, together with that scope's tag.
    pub fn lookup(&self, name: &str) -> Option<(&V, &E)> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).map(|value| (value, &scope.extra)))
    }
}
