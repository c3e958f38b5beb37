use chrono;
use uuid;

use controller;
use settings;

/// Snapshot printed by `trickle read`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub id: uuid::Uuid,
    pub name: String,
    pub sampled_at: chrono::DateTime<chrono::Utc>,
    pub raw_moisture: i32,
    pub moisture_percentage: i32,
    pub moisture_threshold: i32,
    pub needs_water: bool,
}

impl Status {
    pub fn new(
        plant: &settings::Plant,
        sampled_at: chrono::DateTime<chrono::Utc>,
        sample: &controller::Sample,
    ) -> Status {
        Status {
            id: plant.id,
            name: plant.name.to_owned(),
            sampled_at,
            raw_moisture: sample.raw_moisture,
            moisture_percentage: sample.moisture_percentage,
            moisture_threshold: sample.moisture_threshold,
            needs_water: sample.needs_water,
        }
    }
}
