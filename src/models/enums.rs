use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Role {
    Patient => "patient",
    Doctor => "doctor",
    Admin => "admin",
});

str_enum!(Gender {
    Female => "Female",
    Male => "Male",
});

str_enum!(MarkerStatus {
    Positive => "Positive",
    Negative => "Negative",
});

impl MarkerStatus {
    /// Presence booleans on the wire map to the categorical strings the
    /// marker model was trained on.
    pub fn from_presence(present: bool) -> Self {
        if present {
            Self::Positive
        } else {
            Self::Negative
        }
    }
}

/// Categorical outcome of the gene-expression risk classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    #[serde(rename = "High Risk")]
    HighRisk,
    #[serde(rename = "Low Risk")]
    LowRisk,
}

impl RiskLabel {
    /// High risk strictly above 50%; exactly 50.00 stays low risk.
    pub fn from_percentage(pct: f64) -> Self {
        if pct > 50.0 {
            Self::HighRisk
        } else {
            Self::LowRisk
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HighRisk => "High Risk",
            Self::LowRisk => "Low Risk",
        }
    }
}

impl std::str::FromStr for RiskLabel {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "High Risk" => Ok(Self::HighRisk),
            "Low Risk" => Ok(Self::LowRisk),
            _ => Err(DatabaseError::InvalidEnum {
                field: "RiskLabel".into(),
                value: s.into(),
            }),
        }
    }
}
