use serde::{Deserialize, Serialize};

/// Search filters for the property listing endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchParams {
    /// Transaction type, e.g. `Alquiler` or `Venta`
    pub transaction_type: Option<String>,
    /// Property type, e.g. `Casa` or `Departamento`
    pub property_type: Option<String>,
    pub neighborhood: Option<String>,
    pub location: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_bedrooms: Option<u32>,
    pub min_bathrooms: Option<u32>,
    /// Minimum size in square meters
    pub min_sqm: Option<f64>,
    /// Maximum size in square meters
    pub max_sqm: Option<f64>,
    pub status: Option<String>,
    pub temporary_rental: Option<bool>,
}

impl SearchParams {
    /// Filters for the temporary-rental back-office listing
    pub fn temporary_rentals() -> Self {
        Self {
            transaction_type: Some("Alquiler".to_string()),
            temporary_rental: Some(true),
            ..Self::default()
        }
    }

    /// Query pairs using the backend's parameter names. Unset filters are
    /// left out.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();

        let mut push = |key: &'static str, value: Option<String>| {
            if let Some(value) = value {
                query.push((key, value));
            }
        };

        push("transaccionTipo", self.transaction_type.clone());
        push("tipoPropiedad", self.property_type.clone());
        push("barrio", self.neighborhood.clone());
        push("ubicacion", self.location.clone());
        push("precioMin", self.min_price.map(|v| v.to_string()));
        push("precioMax", self.max_price.map(|v| v.to_string()));
        push("habitacionesMin", self.min_bedrooms.map(|v| v.to_string()));
        push("banosMin", self.min_bathrooms.map(|v| v.to_string()));
        push("superficieMin", self.min_sqm.map(|v| v.to_string()));
        push("superficieMax", self.max_sqm.map(|v| v.to_string()));
        push("estado", self.status.clone());
        push("esAlquilerTemporario", self.temporary_rental.map(|v| v.to_string()));

        query
    }
}
