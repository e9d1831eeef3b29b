use serde::{Deserialize, Serialize};

/// Role of an authenticated user, from the backend's numeric `idrol`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    Owner,
    Tenant,
    Admin,
    Buyer,
    User,
}

impl UserRole {
    pub fn from_id(id: Option<i64>) -> Self {
        match id {
            Some(1) => Self::Owner,
            Some(2) => Self::Tenant,
            Some(3) => Self::Admin,
            Some(4) => Self::Buyer,
            _ => Self::User,
        }
    }

    /// Display name used by the back-office
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Owner => "Propietario",
            Self::Tenant => "Inquilino",
            Self::Admin => "Administrador",
            Self::Buyer => "Comprador",
            Self::User => "Usuario",
        }
    }
}

/// Profile of the logged-in user as returned by the login endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(alias = "_id", default)]
    pub id: Option<String>,
    #[serde(rename = "nombre", default)]
    pub first_name: Option<String>,
    #[serde(rename = "apellido", default)]
    pub last_name: Option<String>,
    #[serde(rename = "correo", default)]
    pub email: Option<String>,
    #[serde(rename = "idrol", default)]
    pub role_id: Option<i64>,
}

impl UserProfile {
    pub fn role(&self) -> UserRole {
        UserRole::from_id(self.role_id)
    }

    pub fn full_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}
