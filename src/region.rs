use serde::Deserialize;
use std::{fmt, str::FromStr};

use crate::error::PipelineError;

/// Builds the `Region` enum plus its lookup tables from two code lists.
/// Variant names are the dataset codes verbatim.
macro_rules! region_catalog {
    (
        countries: [$($(#[$meta:meta])* $country:ident),* $(,)?],
        aggregates: [$($aggregate:ident),* $(,)?] $(,)?
    ) => {
        /// A region or country code present in the Eurostat extract.
        #[allow(non_camel_case_types, clippy::upper_case_acronyms)]
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
        #[serde(try_from = "String")]
        pub enum Region {
            $($(#[$meta])* $country,)*
            $($aggregate,)*
        }

        impl Region {
            /// Every catalogued code, countries first.
            pub const ALL: &'static [Region] = &[
                $(Region::$country,)*
                $(Region::$aggregate,)*
            ];

            /// Codes that describe a group of countries rather than one.
            pub const AGGREGATES: &'static [Region] = &[$(Region::$aggregate,)*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Region::$country => stringify!($country),)*
                    $(Region::$aggregate => stringify!($aggregate),)*
                }
            }

            fn lookup(code: &str) -> Option<Self> {
                match code {
                    $(stringify!($country) => Some(Region::$country),)*
                    $(stringify!($aggregate) => Some(Region::$aggregate),)*
                    _ => None,
                }
            }
        }
    };
}

region_catalog! {
    countries: [
        AT, FI, ES, EL, EE, DK, DE, CZ, CY, CH, BG, BE, FX, SK, SI, SE, RO,
        #[default] PT,
        PL, NO, NL, LU, LT, IT, UK, IS, HU, IE, MT, MK, LI, FR, RS, HR, LV, UA,
        TR, ME, AL, AZ, GE, BY, AM, MD, SM, RU, XK,
    ],
    aggregates: [
        EFTA, EA18, EA19, EU28, EEA31, DE_TOT, EU27_2020, EU27_2007, EEA30_2007,
    ],
}

impl Region {
    pub fn is_aggregate(&self) -> bool {
        Self::AGGREGATES.contains(self)
    }

    /// Catalogued codes that are actual countries.
    pub fn countries() -> Vec<Region> {
        Self::ALL
            .iter()
            .copied()
            .filter(|r| !r.is_aggregate())
            .collect()
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = PipelineError;

    /// Accepts surrounding whitespace and any ASCII case (`" pt"` → `PT`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Region::lookup(&code).ok_or_else(|| PipelineError::InvalidRegion(s.to_string()))
    }
}

impl TryFrom<String> for Region {
    type Error = PipelineError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
