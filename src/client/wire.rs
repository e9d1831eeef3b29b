//! Request and response shapes of the `/Propiedad` and `/Usuario` endpoints.

use crate::models::{
    AvailabilityRange, AvailabilitySnapshot, Property, PropertyStatus, RangeStatus, RangeUpdate,
    UserProfile,
};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// `{status, value, message}` wrapper used by every endpoint
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub status: bool,
    pub value: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AvailabilityPayload {
    #[serde(default)]
    pub estado: Option<String>,
    #[serde(default)]
    pub availability: Option<Vec<RangeWire>>,
    /// Older backends name the array in Spanish
    #[serde(default)]
    pub disponibilidad: Option<Vec<RangeWire>>,
}

impl AvailabilityPayload {
    pub fn into_snapshot(self) -> AvailabilitySnapshot {
        let ranges = self
            .availability
            .or(self.disponibilidad)
            .unwrap_or_default()
            .into_iter()
            .filter_map(RangeWire::into_range)
            .collect();

        AvailabilitySnapshot {
            status: PropertyStatus::from_raw(self.estado.as_deref()),
            ranges,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeWire {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, rename = "_id")]
    pub object_id: Option<Value>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub deposit: Option<f64>,
    #[serde(default)]
    pub guests: Option<f64>,
}

impl RangeWire {
    /// Convert to a domain range, normalizing the status.
    ///
    /// Ranges without parseable dates or with an unknown status are dropped;
    /// they can never classify as anything but unset.
    pub fn into_range(self) -> Option<AvailabilityRange> {
        let id = self
            .id
            .as_ref()
            .or(self.object_id.as_ref())
            .and_then(id_string)
            .unwrap_or_default();

        let (Some(start_date), Some(end_date)) = (
            self.start_date.as_deref().and_then(parse_wire_date),
            self.end_date.as_deref().and_then(parse_wire_date),
        ) else {
            warn!(range_id = %id, start = ?self.start_date, end = ?self.end_date, "Dropping range with unreadable dates");
            return None;
        };

        let status = match self.status.as_deref() {
            None => RangeStatus::Available,
            Some(raw) => match RangeStatus::normalize(raw) {
                Some(status) => status,
                None => {
                    warn!(range_id = %id, status = raw, "Dropping range with unknown status");
                    return None;
                }
            },
        };

        if start_date > end_date {
            warn!(range_id = %id, %start_date, %end_date, "Dropping range that ends before it starts");
            return None;
        }

        Some(AvailabilityRange {
            id,
            start_date,
            end_date,
            status,
            client_name: self.client_name.unwrap_or_default(),
            deposit: self.deposit.filter(|d| *d >= 0.0).unwrap_or(0.0),
            guests: self
                .guests
                .filter(|g| *g >= 1.0)
                .map(|g| g as u32)
                .unwrap_or(1),
        })
    }
}

/// Identifiers arrive as strings, numbers or `{"$oid": "..."}` objects.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("$oid").and_then(id_string),
        _ => None,
    }
}

/// Calendar day of an ISO-8601 date or timestamp. Only the `yyyy-MM-dd`
/// prefix is read; time of day never matters.
pub fn parse_wire_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Midnight UTC of `date` in the backend's timestamp format.
pub fn format_wire_date(date: NaiveDate) -> String {
    date.and_time(NaiveTime::MIN)
        .and_utc()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

/// Body of `PUT /Propiedad/Disponibilidad/{id}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertRangeBody<'a> {
    pub start_date: String,
    pub end_date: String,
    pub client_name: &'a str,
    pub deposit: f64,
    pub guests: u32,
    pub status: &'static str,
}

impl<'a> From<&'a RangeUpdate> for UpsertRangeBody<'a> {
    fn from(update: &'a RangeUpdate) -> Self {
        Self {
            start_date: format_wire_date(update.start_date),
            end_date: format_wire_date(update.end_date),
            client_name: &update.client_name,
            deposit: update.deposit,
            guests: update.guests,
            status: update.status.as_wire(),
        }
    }
}

/// Property record from `/Propiedad/Buscar` and `/Propiedad/Obtener`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyWire {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, rename = "_id")]
    pub object_id: Option<Value>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub titulo: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub direccion: Option<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub barrio: Option<String>,
    #[serde(default)]
    pub capacidad_personas: Option<f64>,
    #[serde(default)]
    pub estadia_minima: Option<f64>,
    #[serde(default)]
    pub horario_check_in: Option<String>,
    #[serde(default)]
    pub horario_check_out: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub precio_por_noche: Option<f64>,
    #[serde(default)]
    pub precio_por_semana: Option<f64>,
    #[serde(default)]
    pub precio_por_mes: Option<f64>,
    #[serde(default)]
    pub estado: Option<String>,
    #[serde(default)]
    pub availability: Option<Vec<RangeWire>>,
}

impl PropertyWire {
    /// Convert to a domain property, applying the back-office defaults.
    pub fn into_property(self) -> Option<Property> {
        let Some(id) = self.id.as_ref().or(self.object_id.as_ref()).and_then(id_string) else {
            warn!(title = ?self.title.as_ref().or(self.titulo.as_ref()), "Skipping property without an id");
            return None;
        };

        let non_blank = |s: Option<String>| s.filter(|s| !s.trim().is_empty());
        let either = |en: Option<String>, es: Option<String>| non_blank(en).or_else(|| non_blank(es));
        let positive = |n: Option<f64>| n.filter(|n| *n >= 1.0).map(|n| n as u32).unwrap_or(1);

        Some(Property {
            id,
            title: either(self.title, self.titulo).unwrap_or_else(|| "Sin título".to_string()),
            address: either(self.address, self.direccion),
            neighborhood: either(self.neighborhood, self.barrio),
            capacity: positive(self.capacidad_personas),
            min_stay_nights: positive(self.estadia_minima),
            check_in_time: non_blank(self.horario_check_in).unwrap_or_else(|| "15:00".to_string()),
            check_out_time: non_blank(self.horario_check_out).unwrap_or_else(|| "11:00".to_string()),
            currency: non_blank(self.currency).unwrap_or_else(|| "USD".to_string()),
            price_per_night: self.precio_por_noche.unwrap_or(0.0),
            price_per_week: self.precio_por_semana.unwrap_or(0.0),
            price_per_month: self.precio_por_mes.unwrap_or(0.0),
            status: PropertyStatus::from_raw(self.estado.as_deref()),
            availability: self
                .availability
                .unwrap_or_default()
                .into_iter()
                .filter_map(RangeWire::into_range)
                .collect(),
        })
    }
}

/// Body of `POST /Usuario/IniciarSesion`
#[derive(Debug, Serialize)]
pub struct LoginBody<'a> {
    pub correo: &'a str,
    #[serde(rename = "contrasenaHash")]
    pub contrasena_hash: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub value: Option<UserProfile>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_availability_payload_normalizes_ranges() {
        let body = r#"{
            "status": true,
            "value": {
                "estado": "Reservado",
                "availability": [
                    {"_id": {"$oid": "66a1"}, "startDate": "2024-06-01T00:00:00.000Z", "endDate": "2024-06-05T00:00:00.000Z", "status": "Disponible"},
                    {"id": "r2", "startDate": "2024-06-06", "endDate": "2024-06-08", "status": "Ocupado", "clientName": "Lucía", "deposit": 150.5, "guests": 3},
                    {"id": "r3", "startDate": "2024-06-09", "endDate": "2024-06-09"},
                    {"id": "r4", "startDate": "2024-06-10", "endDate": "2024-06-12", "status": "bloqueado"},
                    {"id": "r5", "endDate": "2024-06-12", "status": "disponible"}
                ]
            }
        }"#;

        let envelope: Envelope<AvailabilityPayload> = serde_json::from_str(body).unwrap();
        assert!(envelope.status);
        let snapshot = envelope.value.unwrap().into_snapshot();

        assert_eq!(snapshot.status, PropertyStatus::Reserved);
        assert_eq!(snapshot.ranges.len(), 3);

        let first = &snapshot.ranges[0];
        assert_eq!(first.id, "66a1");
        assert_eq!(first.start_date, date(2024, 6, 1));
        assert_eq!(first.status, RangeStatus::Available);
        assert_eq!(first.guests, 1);
        assert_eq!(first.deposit, 0.0);

        let second = &snapshot.ranges[1];
        assert_eq!(second.status, RangeStatus::Occupied);
        assert_eq!(second.client_name, "Lucía");
        assert_eq!(second.guests, 3);
        assert_eq!(second.deposit, 150.5);

        // missing status means available
        assert_eq!(snapshot.ranges[2].status, RangeStatus::Available);
    }

    #[test]
    fn test_spanish_array_name_and_missing_estado() {
        let body = r#"{"disponibilidad": [{"id": 7, "startDate": "2024-01-01", "endDate": "2024-01-02", "status": "reservado_temp"}]}"#;
        let payload: AvailabilityPayload = serde_json::from_str(body).unwrap();
        let snapshot = payload.into_snapshot();

        assert_eq!(snapshot.status, PropertyStatus::Available);
        assert_eq!(snapshot.ranges[0].id, "7");
        assert_eq!(snapshot.ranges[0].status, RangeStatus::Reserved);
    }

    #[test]
    fn test_null_availability_is_empty() {
        let payload: AvailabilityPayload =
            serde_json::from_str(r#"{"estado": null, "availability": null}"#).unwrap();
        assert_eq!(payload.into_snapshot(), AvailabilitySnapshot::default());
    }

    #[test]
    fn test_upsert_body_shape() {
        let update = RangeUpdate {
            start_date: date(2024, 8, 1),
            end_date: date(2024, 8, 5),
            status: RangeStatus::Reserved,
            client_name: "Marta".to_string(),
            deposit: 200.0,
            guests: 2,
        };
        let body = serde_json::to_value(UpsertRangeBody::from(&update)).unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "startDate": "2024-08-01T00:00:00.000Z",
                "endDate": "2024-08-05T00:00:00.000Z",
                "clientName": "Marta",
                "deposit": 200.0,
                "guests": 2,
                "status": "reservado_temp"
            })
        );
    }

    #[test]
    fn test_parse_wire_date() {
        assert_eq!(parse_wire_date("2024-02-29T03:00:00Z"), Some(date(2024, 2, 29)));
        assert_eq!(parse_wire_date("2024-02-29"), Some(date(2024, 2, 29)));
        assert_eq!(parse_wire_date("29/02/2024"), None);
        assert_eq!(parse_wire_date("2024"), None);
    }

    #[test]
    fn test_property_defaults() {
        let wire: PropertyWire = serde_json::from_str(
            r#"{"_id": "p1", "titulo": "Depto Palermo", "capacidadPersonas": 4, "estadiaMinima": 0, "estado": "Disponible"}"#,
        )
        .unwrap();
        let property = wire.into_property().unwrap();

        assert_eq!(property.id, "p1");
        assert_eq!(property.capacity, 4);
        assert_eq!(property.min_stay_nights, 1);
        assert_eq!(property.check_in_time, "15:00");
        assert_eq!(property.check_out_time, "11:00");
        assert_eq!(property.currency, "USD");
        assert_eq!(property.status, PropertyStatus::Available);
        assert!(property.availability.is_empty());
    }

    #[test]
    fn test_property_without_id_is_skipped() {
        let wire: PropertyWire = serde_json::from_str(r#"{"titulo": "Sin id"}"#).unwrap();
        assert!(wire.into_property().is_none());
    }

    #[test]
    fn test_property_reads_english_keys_first() {
        let wire: PropertyWire = serde_json::from_str(
            r#"{"id": 7, "title": "Loft Recoleta", "titulo": "Viejo", "address": "Ayacucho 1200", "barrio": "Recoleta"}"#,
        )
        .unwrap();
        let property = wire.into_property().unwrap();

        assert_eq!(property.title, "Loft Recoleta");
        assert_eq!(property.address.as_deref(), Some("Ayacucho 1200"));
        assert_eq!(property.neighborhood.as_deref(), Some("Recoleta"));

        let wire: PropertyWire = serde_json::from_str(r#"{"id": "p2", "title": "  ", "titulo": "Casa Tigre"}"#).unwrap();
        assert_eq!(wire.into_property().unwrap().title, "Casa Tigre");
    }
}
