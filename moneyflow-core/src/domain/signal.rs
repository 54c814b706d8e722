//! Classification labels produced by the indicator engine.
//!
//! The labels are part of the published artifact and are read back by the
//! ranking views, so each enum round-trips through its display label.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} label: '{label}'")]
pub struct ParseLabelError {
    pub kind: &'static str,
    pub label: String,
}

macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) { $($variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Label as written to the artifact.
            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = ParseLabelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($label => Ok($name::$variant),)+
                    other => Err(ParseLabelError {
                        kind: $kind,
                        label: other.to_string(),
                    }),
                }
            }
        }
    };
}

labelled_enum! {
    /// Price-vs-VWAP classification gated on run-wide median volume.
    Signal ("signal") {
        Akumulasi => "Akumulasi",
        Distribusi => "Distribusi",
        Netral => "Netral",
    }
}

labelled_enum! {
    /// `Signal` upgraded by a strong bid/offer imbalance.
    FinalSignal ("final signal") {
        StrongAkumulasi => "Strong Akumulasi",
        StrongDistribusi => "Strong Distribusi",
        Akumulasi => "Akumulasi",
        Distribusi => "Distribusi",
        Netral => "Netral",
    }
}

labelled_enum! {
    /// Foreign investor net direction.
    ForeignFlow ("foreign flow") {
        Inflow => "Inflow",
        Outflow => "Outflow",
        Netral => "Netral",
    }
}

labelled_enum! {
    /// Direction of VWAP relative to the previous trading day.
    FlowDirection ("flow direction") {
        Positive => "Positive",
        Negative => "Negative",
        Neutral => "Neutral",
    }
}

labelled_enum! {
    /// Money Flow Index zone.
    MfiSignal ("MFI signal") {
        Overbought => "Overbought",
        Oversold => "Oversold",
        Normal => "Normal",
    }
}

impl FinalSignal {
    /// True for both plain and strong accumulation.
    pub fn is_accumulation(&self) -> bool {
        matches!(self, FinalSignal::Akumulasi | FinalSignal::StrongAkumulasi)
    }

    pub fn is_strong(&self) -> bool {
        matches!(
            self,
            FinalSignal::StrongAkumulasi | FinalSignal::StrongDistribusi
        )
    }
}

impl From<Signal> for FinalSignal {
    fn from(signal: Signal) -> Self {
        match signal {
            Signal::Akumulasi => FinalSignal::Akumulasi,
            Signal::Distribusi => FinalSignal::Distribusi,
            Signal::Netral => FinalSignal::Netral,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip() {
        for s in FinalSignal::ALL {
            assert_eq!(s.label().parse::<FinalSignal>().unwrap(), *s);
        }
        for f in ForeignFlow::ALL {
            assert_eq!(f.to_string().parse::<ForeignFlow>().unwrap(), *f);
        }
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = "Sideways".parse::<Signal>().unwrap_err();
        assert_eq!(err.kind, "signal");
        assert!(err.to_string().contains("Sideways"));
    }

    #[test]
    fn accumulation_covers_strong_variant() {
        assert!(FinalSignal::StrongAkumulasi.is_accumulation());
        assert!(FinalSignal::Akumulasi.is_accumulation());
        assert!(!FinalSignal::StrongDistribusi.is_accumulation());
        assert!(FinalSignal::StrongDistribusi.is_strong());
    }

    #[test]
    fn serde_uses_labels() {
        let json = serde_json::to_string(&FinalSignal::StrongAkumulasi).unwrap();
        assert_eq!(json, "\"Strong Akumulasi\"");
    }
}
