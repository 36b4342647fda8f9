use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Callbacks – one input property drives one output property
// ---------------------------------------------------------------------------

#[derive(Error, Debug, PartialEq)]
pub enum CallbackError {
    #[error("output {0} already has a callback")]
    DuplicateOutput(ComponentProperty),
    #[error("no callback updates {0}")]
    UnknownOutput(String),
    #[error("callback for {output} listens to {expected}, not {got}")]
    InputMismatch {
        output: ComponentProperty,
        expected: ComponentProperty,
        got: String,
    },
    #[error("invalid value for {input}: {reason}")]
    InvalidInput { input: ComponentProperty, reason: String },
    #[error("failed to serialize output of {output}: {reason}")]
    Serialize { output: ComponentProperty, reason: String },
}

// ---------------------------------------------------------------------------
// Component properties
// ---------------------------------------------------------------------------

/// A property of a page component, written `id.property` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentProperty {
    pub id: String,
    pub property: String,
}

impl ComponentProperty {
    pub fn new(id: &str, property: &str) -> Self {
        Self {
            id: id.to_string(),
            property: property.to_string(),
        }
    }

    /// Parse `id.property`. Component ids may themselves contain dots, so
    /// the property is whatever follows the last one.
    pub fn parse(s: &str) -> Option<Self> {
        let (id, property) = s.rsplit_once('.')?;
        if id.is_empty() || property.is_empty() {
            return None;
        }
        Some(Self::new(id, property))
    }
}

impl fmt::Display for ComponentProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.id, self.property)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Turns the new input value into the new output value.
pub type Handler = fn(&AppState, &Value) -> Result<Value, CallbackError>;

pub struct Callback {
    pub name: &'static str,
    pub input: ComponentProperty,
    pub output: ComponentProperty,
    pub handler: Handler,
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("name", &self.name)
            .field("input", &self.input)
            .field("output", &self.output)
            .finish()
    }
}

/// All callbacks of the page. Each output is owned by at most one callback.
#[derive(Debug, Default)]
pub struct CallbackRegistry {
    callbacks: Vec<Callback>,
}

impl CallbackRegistry {
    pub fn register(&mut self, callback: Callback) -> Result<(), CallbackError> {
        if self.callbacks.iter().any(|c| c.output == callback.output) {
            return Err(CallbackError::DuplicateOutput(callback.output));
        }
        log::debug!(
            "registered callback {}: {} -> {}",
            callback.name,
            callback.input,
            callback.output
        );
        self.callbacks.push(callback);
        Ok(())
    }

    pub fn get(&self, output: &ComponentProperty) -> Option<&Callback> {
        self.callbacks.iter().find(|c| &c.output == output)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Callback> {
        self.callbacks.iter()
    }

    /// Run the callback that owns `output`, given the new value of its input.
    pub fn dispatch(
        &self,
        state: &AppState,
        output: &str,
        input: &ComponentProperty,
        value: &Value,
    ) -> Result<(ComponentProperty, Value), CallbackError> {
        let callback = ComponentProperty::parse(output)
            .and_then(|o| self.get(&o))
            .ok_or_else(|| CallbackError::UnknownOutput(output.to_string()))?;

        if &callback.input != input {
            return Err(CallbackError::InputMismatch {
                output: callback.output.clone(),
                expected: callback.input.clone(),
                got: input.to_string(),
            });
        }

        log::debug!("running callback {}", callback.name);
        let result = (callback.handler)(state, value)?;
        Ok((callback.output.clone(), result))
    }
}
