//! Fixed copy shown around the request form.

use serde::{Deserialize, Serialize};

pub const ESTIMATED_ARRIVAL: &str = "8-12 minutes";
pub const AVERAGE_RESPONSE_TIME: &str =
    "8-15 minutes in urban areas, 15-30 minutes in rural areas.";
pub const PRIMARY_EMERGENCY_NUMBER: &str = "108";

pub const SUBMIT_LABEL_IDLE: &str = "Request Emergency Ambulance";
pub const SUBMIT_LABEL_LOADING: &str = "Requesting...";

pub const WHILE_YOU_WAIT: [&str; 5] = [
    "Keep the patient calm and comfortable",
    "Do not move the patient unless necessary",
    "Gather important medical documents",
    "Clear the path for ambulance access",
    "Stay on the line if called by emergency services",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyNumber {
    pub service: String,
    pub number: String,
}

pub fn emergency_numbers() -> Vec<EmergencyNumber> {
    [
        ("National Emergency", PRIMARY_EMERGENCY_NUMBER),
        ("Police", "100"),
        ("Fire Brigade", "101"),
    ]
    .into_iter()
    .map(|(service, number)| EmergencyNumber {
        service: service.into(),
        number: number.into(),
    })
    .collect()
}

pub fn guidance() -> Vec<String> {
    WHILE_YOU_WAIT.iter().map(|s| (*s).to_string()).collect()
}
