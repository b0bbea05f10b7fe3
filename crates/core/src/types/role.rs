//! Enumerations shared across the domain: user roles and pool attributes.

use serde::{Deserialize, Serialize};

/// User role.
///
/// Admins implicitly access every pool and manage users, pools and stock.
/// Regular users (technicians) only see the pools assigned to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access, including user and pool management.
    Admin,
    /// Technician restricted to assigned pools.
    #[default]
    User,
}

/// Sanitizer system of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SanitizerType {
    #[default]
    Chlorine,
    Salt,
}

/// Interior surface material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    #[default]
    Plaster,
    Vinyl,
    Fiberglass,
}

/// Body of water category. Changes the target chemistry ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    Pool,
    Spa,
}

macro_rules! impl_str_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            /// Returns the lowercase wire name.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl ::core::fmt::Display for $ty {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("invalid ", stringify!($ty), ": {}"), s)),
                }
            }
        }
    };
}

impl_str_enum!(Role { Admin => "admin", User => "user" });
impl_str_enum!(SanitizerType { Chlorine => "chlorine", Salt => "salt" });
impl_str_enum!(Surface { Plaster => "plaster", Vinyl => "vinyl", Fiberglass => "fiberglass" });
impl_str_enum!(Category { Pool => "pool", Spa => "spa" });

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(Role::User.to_string(), "user");
        assert!("super_admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_category_serde() {
        let json = serde_json::to_string(&Category::Spa).expect("serialize");
        assert_eq!(json, "\"spa\"");
        assert_eq!("spa".parse::<Category>(), Ok(Category::Spa));
    }

    #[test]
    fn test_surface_parse_error_message() {
        let err = "granite".parse::<Surface>().expect_err("invalid");
        assert_eq!(err, "invalid Surface: granite");
    }
}
