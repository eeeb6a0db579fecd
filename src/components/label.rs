use bevy_ecs::prelude::Component;

/// Human-readable entity name used by scenarios and logs.
#[derive(Component, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Label(pub String);

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
