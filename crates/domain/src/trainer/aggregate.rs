use common::AggregateId;
use persistence::Aggregate;

use super::TrainerError;
use crate::email::looks_like_email;

/// A member of staff who coaches clients.
#[derive(Debug, Clone, PartialEq)]
pub struct Trainer {
    id: AggregateId,
    first_name: String,
    last_name: String,
    email: String,
}

impl Trainer {
    pub fn register(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, TrainerError> {
        let email = email.into();
        if !looks_like_email(&email) {
            return Err(TrainerError::InvalidEmail(email));
        }

        Ok(Self::restore(
            AggregateId::new(),
            first_name.into(),
            last_name.into(),
            email,
        ))
    }

    pub fn restore(id: AggregateId, first_name: String, last_name: String, email: String) -> Self {
        Self {
            id,
            first_name,
            last_name,
            email,
        }
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn change_email(&mut self, email: impl Into<String>) -> Result<(), TrainerError> {
        let email = email.into();
        if !looks_like_email(&email) {
            return Err(TrainerError::InvalidEmail(email));
        }
        self.email = email;
        Ok(())
    }
}

impl Aggregate for Trainer {
    fn aggregate_type() -> &'static str {
        "Trainer"
    }

    fn id(&self) -> AggregateId {
        self.id
    }
}
