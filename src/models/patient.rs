//! Patient model.
//!
//! A patient is created once, on batch ingestion or on an emergency
//! event, and is never edited afterwards. Clinical attributes are inputs
//! to the duration predictor and to dispatching; the core does not
//! interpret them.

use serde::{Deserialize, Serialize};

use super::Minutes;

/// Recorded sex of a patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Sex {
    Female,
    Male,
    #[default]
    Unspecified,
}

/// A surgical patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    /// Unique patient identifier.
    pub id: String,
    /// Age in years.
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub sex: Sex,
    /// Body-mass index.
    #[serde(default)]
    pub bmi: f64,
    /// ASA physical status (1..=6).
    #[serde(default = "default_asa")]
    pub asa_score: u8,
    /// Anesthesia type (e.g. "General", "Regional").
    #[serde(default)]
    pub anesthesia: Option<String>,
    #[serde(default)]
    pub has_comorbidity: bool,
    /// Required surgical specialty.
    pub specialty: String,
    /// Time the patient is available for surgery.
    #[serde(default)]
    pub arrival: Minutes,
    /// Surgeon requested on the booking, if any.
    #[serde(default)]
    pub requested_surgeon: Option<String>,
    /// Shared equipment needed during surgery (e.g. "C-Arm").
    #[serde(default)]
    pub equipment: Vec<String>,
}

fn default_asa() -> u8 {
    1
}

impl Patient {
    /// Creates a patient with the given id and required specialty.
    pub fn new(id: impl Into<String>, specialty: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            age: 0,
            sex: Sex::Unspecified,
            bmi: 0.0,
            asa_score: default_asa(),
            anesthesia: None,
            has_comorbidity: false,
            specialty: specialty.into(),
            arrival: 0,
            requested_surgeon: None,
            equipment: Vec::new(),
        }
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = age;
        self
    }

    pub fn with_sex(mut self, sex: Sex) -> Self {
        self.sex = sex;
        self
    }

    pub fn with_bmi(mut self, bmi: f64) -> Self {
        self.bmi = bmi;
        self
    }

    /// Sets the ASA score.
    pub fn with_asa(mut self, asa_score: u8) -> Self {
        self.asa_score = asa_score;
        self
    }

    pub fn with_anesthesia(mut self, anesthesia: impl Into<String>) -> Self {
        self.anesthesia = Some(anesthesia.into());
        self
    }

    pub fn with_comorbidity(mut self, has_comorbidity: bool) -> Self {
        self.has_comorbidity = has_comorbidity;
        self
    }

    /// Sets the arrival time.
    pub fn with_arrival(mut self, arrival: Minutes) -> Self {
        self.arrival = arrival;
        self
    }

    /// Requests a specific surgeon.
    pub fn with_surgeon(mut self, surgeon_id: impl Into<String>) -> Self {
        self.requested_surgeon = Some(surgeon_id.into());
        self
    }

    /// Adds a required equipment type.
    pub fn with_equipment(mut self, equipment: impl Into<String>) -> Self {
        self.equipment.push(equipment.into());
        self
    }
}
