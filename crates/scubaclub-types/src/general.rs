use std::{fmt::Display, str::FromStr};

use garde::Validate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Validate, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[garde(transparent)]
pub struct ValidEmail(#[garde(email)] String);

#[cfg(feature = "e2e-tests")]
impl ValidEmail {
    pub fn cheat(email: String) -> Self {
        ValidEmail(email)
    }
}

impl FromStr for ValidEmail {
    type Err = garde::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let email = ValidEmail(s.to_string());
        email.validate()?;
        Ok(email)
    }
}

impl AsRef<str> for ValidEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for ValidEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Login name: 1 to 150 ASCII letters or digits
#[derive(Debug, Clone, PartialEq, Eq, Validate, Hash, Serialize, Deserialize)]
#[garde(transparent)]
pub struct Username(#[garde(ascii, alphanumeric, length(min = 1, max = 150))] String);

impl FromStr for Username {
    type Err = garde::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = Username(s.to_string());
        name.validate()?;
        Ok(name)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
