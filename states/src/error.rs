use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("State not found: {name}, context: {context}")]
    StateNotFound {
        name: &'static str,
        context: String,
    },
    #[error("Command not registered: {name}")]
    CommandNotRegistered { name: &'static str },
}

impl Error {
    pub fn state_not_found(name: &'static str, context: impl Into<String>) -> Self {
        Self::StateNotFound {
            name,
            context: context.into(),
        }
    }

    pub fn command_not_registered(name: &'static str) -> Self {
        Self::CommandNotRegistered { name }
    }
}
