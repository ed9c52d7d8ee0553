use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw database key.
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw database key.
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

id_newtype!(
    /// Identifier of a vehicle model in the rentable inventory.
    ModelId
);

id_newtype!(
    /// Identifier of a committed rent.
    RentId
);

id_newtype!(
    /// Identifier of a rent restriction row.
    RestrictionId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_id_parses_from_path_segment() {
        let id: ModelId = "2".parse().unwrap();
        assert_eq!(id, ModelId::new(2));
        assert_eq!(id.as_i64(), 2);
    }

    #[test]
    fn model_id_rejects_garbage() {
        assert!("two".parse::<ModelId>().is_err());
        assert!("".parse::<ModelId>().is_err());
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&RentId::new(42)).unwrap();
        assert_eq!(json, "42");
        let back: RentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RentId::new(42));
    }
}
