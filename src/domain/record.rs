//! Clinical record captured by the intake form.
//!
//! Categorical fields are closed enums whose numeric codes are part of the
//! contract with the trained model (see `features`). The codes must never be
//! renumbered.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Oldest date accepted for any of the three treatment dates.
pub fn earliest_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).expect("1900-01-01 is a valid calendar date")
}

/// Highest age accepted by the form.
pub const MAX_AGE: u32 = 120;

/// A closed set of labelled choices with a fixed numeric code.
pub trait Category: Copy + Eq + Sized + 'static {
    /// Every variant, in display order.
    const ALL: &'static [Self];

    /// Label shown to the user and used in JSON.
    fn label(self) -> &'static str;

    /// Numeric code fed to the model and stored in the sink.
    fn code(self) -> u8;

    /// Step through `ALL`, wrapping at both ends.
    #[must_use]
    fn cycle(self, forward: bool) -> Self {
        let len = Self::ALL.len();
        let pos = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        let next = if forward { (pos + 1) % len } else { (pos + len - 1) % len };
        Self::ALL[next]
    }
}

macro_rules! category {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident = $code:literal => $label:tt),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl Category for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            fn code(self) -> u8 {
                match self {
                    $(Self::$variant => $code,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|c| c.label().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| {
                        let known: Vec<&str> = Self::ALL.iter().map(|c| c.label()).collect();
                        format!(
                            "unknown {} '{}' (expected one of: {})",
                            stringify!($name),
                            wanted,
                            known.join(", ")
                        )
                    })
            }
        }
    };
}

category! {
    /// Patient gender as recorded in the training data.
    Gender {
        Male = 1 => "Male",
        Female = 0 => "Female",
    }
}

category! {
    /// Binary flag used for family history and comorbidities.
    YesNo {
        Yes = 1 => "Yes",
        No = 0 => "No",
    }
}

category! {
    /// Smoking history.
    SmokingStatus {
        NeverSmoked = 0 => "Never Smoked",
        FormerSmoker = 1 => "Former Smoker",
        PassiveSmoker = 2 => "Passive Smoker",
        CurrentSmoker = 3 => "Current Smoker",
    }
}

category! {
    /// Primary treatment received.
    TreatmentType {
        Surgery = 0 => "Surgery",
        Radiation = 1 => "Radiation",
        Chemotherapy = 2 => "Chemotherapy",
        Combined = 3 => "Combined",
    }
}

category! {
    /// Cancer stage at diagnosis.
    CancerStage {
        I = 0 => "I",
        II = 1 => "II",
        III = 2 => "III",
        IV = 3 => "IV",
    }
}

/// One form submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalRecord {
    /// Patient name (stored, never fed to the model or logged)
    pub name: String,

    /// Age in years (0-120)
    pub age: u32,

    /// Body mass index
    pub bmi: f64,

    /// Cholesterol level
    pub cholesterol: f64,

    pub gender: Gender,
    pub family_history: YesNo,
    pub smoking_status: SmokingStatus,
    pub treatment_type: TreatmentType,
    pub cancer_stage: CancerStage,

    pub diagnosis_date: NaiveDate,
    pub treatment_start: NaiveDate,
    pub treatment_end: NaiveDate,

    pub hypertension: YesNo,
    pub asthma: YesNo,
    pub cirrhosis: YesNo,
    pub other_cancer: YesNo,
}

impl ClinicalRecord {
    /// Days between diagnosis and the start of treatment.
    ///
    /// Negative when the start date precedes the diagnosis; not rejected.
    #[must_use]
    pub fn treatment_delay_days(&self) -> i64 {
        self.treatment_start
            .signed_duration_since(self.diagnosis_date)
            .num_days()
    }

    /// Days between the start and the end of treatment. May be negative.
    #[must_use]
    pub fn treatment_duration_days(&self) -> i64 {
        self.treatment_end
            .signed_duration_since(self.treatment_start)
            .num_days()
    }

    /// Check every field against its form constraint.
    ///
    /// `today` is the upper bound for the three dates.
    ///
    /// # Errors
    /// Returns all violations, one message per field.
    pub fn validate(&self, today: NaiveDate) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Name is required".to_string());
        }
        if self.age > MAX_AGE {
            errors.push(format!("Age {} out of range [0, {MAX_AGE}]", self.age));
        }
        if !self.bmi.is_finite() || self.bmi < 0.0 {
            errors.push(format!("BMI {} must be a non-negative number", self.bmi));
        }
        if !self.cholesterol.is_finite() || self.cholesterol < 0.0 {
            errors.push(format!(
                "Cholesterol level {} must be a non-negative number",
                self.cholesterol
            ));
        }

        let earliest = earliest_date();
        for (label, date) in [
            ("Date of diagnosis", self.diagnosis_date),
            ("Beginning of treatment date", self.treatment_start),
            ("End of treatment date", self.treatment_end),
        ] {
            if date < earliest || date > today {
                errors.push(format!("{label} {date} out of range [{earliest}, {today}]"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
