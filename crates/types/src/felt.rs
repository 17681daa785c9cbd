use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of hex digits in a fully padded field element
pub const FELT_HEX_WIDTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeltParseError {
    #[error("empty field element")]
    Empty,

    #[error("hex field element longer than {FELT_HEX_WIDTH} digits: {0}")]
    TooLong(String),

    #[error("invalid hex digit in field element: {0}")]
    InvalidHex(String),

    #[error("invalid decimal field element: {0}")]
    InvalidDecimal(String),

    #[error("value is not below the field prime: {0}")]
    OutOfRange(String),
}

/// An element of the StarkNet field, used for hashes and addresses.
///
/// Parsing never reduces: anything at or above the prime is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Felt(starknet_types_core::felt::Felt);

impl Felt {
    pub const ZERO: Felt = Felt(starknet_types_core::felt::Felt::ZERO);

    pub fn inner(&self) -> starknet_types_core::felt::Felt {
        self.0
    }

    pub fn to_bytes_be(&self) -> [u8; 32] {
        self.0.to_bytes_be()
    }

    pub fn is_zero(&self) -> bool {
        self.0 == starknet_types_core::felt::Felt::ZERO
    }

    /// Parse `0x`-prefixed or bare hex with up to 64 digits
    pub fn from_hex(s: &str) -> Result<Self, FeltParseError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);

        if digits.is_empty() {
            return Err(FeltParseError::Empty);
        }
        if digits.len() > FELT_HEX_WIDTH {
            return Err(FeltParseError::TooLong(s.to_string()));
        }
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(FeltParseError::InvalidHex(s.to_string()));
        }

        // Equal-width lowercase hex orders like the numbers it encodes
        let padded = format!("{:0>width$}", digits.to_ascii_lowercase(), width = FELT_HEX_WIDTH);
        let max = starknet_types_core::felt::Felt::MAX.to_fixed_hex_string();
        if padded.as_str() > &max[2..] {
            return Err(FeltParseError::OutOfRange(s.to_string()));
        }

        starknet_types_core::felt::Felt::from_hex(&format!("0x{padded}"))
            .map(Self)
            .map_err(|_| FeltParseError::InvalidHex(s.to_string()))
    }

    /// Parse a base-10 integer string
    pub fn from_dec_str(s: &str) -> Result<Self, FeltParseError> {
        if s.is_empty() {
            return Err(FeltParseError::Empty);
        }
        if !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(FeltParseError::InvalidDecimal(s.to_string()));
        }

        let digits = match s.trim_start_matches('0') {
            "" => "0",
            trimmed => trimmed,
        };
        let max = Self(starknet_types_core::felt::Felt::MAX).to_dec_string();
        let above_max = match digits.len().cmp(&max.len()) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => digits > max.as_str(),
        };
        if above_max {
            return Err(FeltParseError::OutOfRange(s.to_string()));
        }

        starknet_types_core::felt::Felt::from_dec_str(digits)
            .map(Self)
            .map_err(|_| FeltParseError::InvalidDecimal(s.to_string()))
    }

    /// Fixed-width rendering: `0x` followed by 64 hex digits
    pub fn to_fixed_hex(&self) -> String {
        self.0.to_fixed_hex_string()
    }

    /// Minimal rendering without leading zeros, `0x0` for zero
    pub fn to_hex(&self) -> String {
        self.0.to_hex_string()
    }

    /// Decimal rendering, as the toolchain expects for signature values
    pub fn to_dec_string(&self) -> String {
        self.0.to_biguint().to_string()
    }
}

impl Default for Felt {
    fn default() -> Self {
        Self::ZERO
    }
}

impl PartialOrd for Felt {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Felt {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_bytes_be().cmp(&other.to_bytes_be())
    }
}

impl From<u64> for Felt {
    fn from(value: u64) -> Self {
        Self(starknet_types_core::felt::Felt::from(value))
    }
}

impl From<u128> for Felt {
    fn from(value: u128) -> Self {
        Self(starknet_types_core::felt::Felt::from(value))
    }
}

impl From<starknet_types_core::felt::Felt> for Felt {
    fn from(felt: starknet_types_core::felt::Felt) -> Self {
        Self(felt)
    }
}

impl FromStr for Felt {
    type Err = FeltParseError;

    /// Hex when prefixed with `0x`, decimal otherwise
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with("0x") || s.starts_with("0X") {
            Self::from_hex(s)
        } else {
            Self::from_dec_str(s)
        }
    }
}

impl fmt::Display for Felt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Felt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Felt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

macro_rules! felt_newtype {
    ($(#[$meta:meta])* $name:ident, $render:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub Felt);

        impl $name {
            pub fn felt(&self) -> Felt {
                self.0
            }
        }

        impl From<Felt> for $name {
            fn from(felt: Felt) -> Self {
                Self(felt)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(Felt::from(value))
            }
        }

        impl FromStr for $name {
            type Err = FeltParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0.$render())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

felt_newtype!(
    /// Identifier of a declared contract class, rendered fixed-width
    ClassHash,
    to_fixed_hex
);

felt_newtype!(
    /// Transaction identifier, rendered as plain hex
    TxHash,
    to_hex
);

felt_newtype!(
    /// Account address, rendered as plain hex
    Address,
    to_hex
);
