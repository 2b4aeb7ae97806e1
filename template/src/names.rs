use std::{borrow::Borrow, fmt, str::FromStr, sync::Arc};

use crate::Error;

pub(crate) fn ensure_valid_name(name: &str, kind: &'static str) -> Result<(), Error> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(Error::InvalidName {
            kind,
            name: name.to_string(),
            reason: "name must not be empty",
        });
    };
    if !first.is_ascii_alphabetic() {
        return Err(Error::InvalidName {
            kind,
            name: name.to_string(),
            reason: "name must start with an ASCII letter",
        });
    }
    for ch in chars {
        if !(ch.is_ascii_alphanumeric() || ch == '-' || ch == '_') {
            return Err(Error::InvalidName {
                kind,
                name: name.to_string(),
                reason: "only ASCII letters, digits, `-` and `_` are allowed",
            });
        }
    }
    Ok(())
}

macro_rules! name_type {
    ($name:ident, $kind:expr) => {
        #[derive(
            Clone,
            Debug,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde_with::DeserializeFromStr,
            serde_with::SerializeDisplay,
        )]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(name: String) -> Result<Self, Error> {
                ensure_valid_name(&name, $kind)?;
                Ok(Self(Arc::from(name)))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                ensure_valid_name(value, $kind)?;
                Ok(Self(Arc::from(value)))
            }
        }

        impl TryFrom<String> for $name {
            type Error = Error;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0.to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

name_type!(LogicalName, "logical");
name_type!(ParameterName, "parameter");
name_type!(OutputName, "output");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        assert!("myApp01".parse::<LogicalName>().is_ok());
        assert!("admin-login".parse::<ParameterName>().is_ok());
        assert!("site_url".parse::<OutputName>().is_ok());
    }

    #[test]
    fn rejects_empty_leading_digit_and_reserved_characters() {
        assert!("".parse::<LogicalName>().is_err());
        assert!("1web".parse::<LogicalName>().is_err());
        assert!("a.b".parse::<LogicalName>().is_err());
        assert!("a/b".parse::<LogicalName>().is_err());
        assert!("a b".parse::<LogicalName>().is_err());
    }
}
