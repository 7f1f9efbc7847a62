//! Acting-user lookup for audit stamping.

/// Supplies the identifier of whoever is performing the current operation.
///
/// `None` means there is no authenticated actor (background jobs, seeding)
/// and is not an error.
pub trait CurrentUser: Send + Sync {
    fn user_id(&self) -> Option<String>;
}

/// No authenticated actor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl CurrentUser for Anonymous {
    fn user_id(&self) -> Option<String> {
        None
    }
}

/// A fixed actor, typically resolved once per request.
#[derive(Debug, Clone)]
pub struct StaticUser(Option<String>);

impl StaticUser {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self(Some(user_id.into()))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn from_option(user_id: Option<String>) -> Self {
        Self(user_id)
    }
}

impl CurrentUser for StaticUser {
    fn user_id(&self) -> Option<String> {
        self.0.clone()
    }
}
