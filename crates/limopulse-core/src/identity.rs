//! Connection identity: the `(user_id, role)` pair a client claims at
//! authenticate time. Trusted as-is; this component never verifies it
//! against a credential store.

/// Audience a connection belongs to. Roles are mutually exclusive per
/// connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Driver,
    Customer,
}

impl Role {
    /// Parse the wire representation. Anything else is an unknown role and
    /// the caller must not register the connection in any bucket.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "ADMIN" => Some(Role::Admin),
            "DRIVER" => Some(Role::Driver),
            "CUSTOMER" => Some(Role::Customer),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Driver => "DRIVER",
            Role::Customer => "CUSTOMER",
        }
    }
}

/// Identity attached to a connection by its `authenticate` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }
}
