//! Variable Serializer: turns story values into a reference-addressed tree.
//!
//! Composite values are registered in an arena and addressed by `index + 1`;
//! reference `0` means "no children". Children are snapshotted one level at a
//! time, so nested tables only get a reference once they are listed.
//! [`VariableSerializer::clear`] drops the arena in one go.

mod format;

use smol_str::SmolStr;
use tale_eval::{evaluate, Context, EvalError, Value};

use crate::protocol::Variable;

use format::{field_path, format_value, index_path};

#[derive(Debug, Clone)]
struct Container {
    indexed: Vec<Value>,
    /// Named children, sorted by key.
    named: Vec<(SmolStr, Value)>,
    /// Expression that reaches this container, when one exists.
    path: Option<String>,
    /// Children as first listed; later expansions reuse their references.
    expanded: Option<Vec<Variable>>,
}

impl Container {
    fn snapshot(value: &Value, path: Option<String>) -> Option<Self> {
        let (indexed, mut named) = match value {
            Value::Array(items) => (items.clone(), Vec::new()),
            Value::Map(fields) => (
                Vec::new(),
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect::<Vec<_>>(),
            ),
            _ => return None,
        };
        named.sort_by(|(left, _), (right, _)| left.cmp(right));
        Some(Self {
            indexed,
            named,
            path,
            expanded: None,
        })
    }
}

#[derive(Debug, Default)]
pub struct VariableSerializer {
    containers: Vec<Container>,
}

impl VariableSerializer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Formats `value` as a client variable, registering it if composite.
    pub fn serialize(&mut self, name: &str, value: &Value) -> Variable {
        self.serialize_at(name, value, Some(name.to_string()))
    }

    fn serialize_at(&mut self, name: &str, value: &Value, path: Option<String>) -> Variable {
        let variables_reference = self.register(value, path.clone());
        Variable {
            name: name.to_string(),
            value: format_value(value),
            r#type: Some(value.type_name().to_string()),
            variables_reference,
            evaluate_name: path,
        }
    }

    /// Allocates a reference for a composite value; scalars get `0`.
    pub fn register_container(&mut self, value: &Value) -> u32 {
        self.register(value, None)
    }

    /// Registers a whole variable context, such as the story state at a stop.
    /// Its children are addressed by their bare names.
    pub fn register_scope(&mut self, state: &Context) -> u32 {
        self.register(&Value::Map(state.clone()), None)
    }

    fn register(&mut self, value: &Value, path: Option<String>) -> u32 {
        match Container::snapshot(value, path) {
            Some(container) => self.push(container),
            None => 0,
        }
    }

    fn push(&mut self, container: Container) -> u32 {
        self.containers.push(container);
        u32::try_from(self.containers.len()).unwrap_or(u32::MAX)
    }

    /// Children of `reference`: indexed elements as `[i]` first, then named
    /// keys in sorted order. Unknown references yield an empty list.
    ///
    /// The first listing registers the composite children; repeated requests
    /// return the same references.
    pub fn get_variables(&mut self, reference: u32) -> Vec<Variable> {
        let Some(index) = reference
            .checked_sub(1)
            .map(|index| index as usize)
            .filter(|index| *index < self.containers.len())
        else {
            return Vec::new();
        };
        if let Some(expanded) = &self.containers[index].expanded {
            return expanded.clone();
        }

        let container = &self.containers[index];
        let parent = container.path.clone();
        let indexed = container.indexed.clone();
        let named = container.named.clone();
        let mut variables = Vec::with_capacity(indexed.len() + named.len());
        for (position, value) in (1..).zip(&indexed) {
            variables.push(self.serialize_at(
                &format!("[{position}]"),
                value,
                index_path(parent.as_deref(), position),
            ));
        }
        for (key, value) in &named {
            variables.push(self.serialize_at(key, value, field_path(parent.as_deref(), key)));
        }
        self.containers[index].expanded = Some(variables.clone());
        variables
    }

    /// Evaluates `expression` with only `context` in scope.
    pub fn evaluate(&self, expression: &str, context: &Context) -> Result<Value, EvalError> {
        evaluate(expression, context)
    }

    /// Invalidates every outstanding reference.
    pub fn clear(&mut self) {
        self.containers.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}
