use scubaclub_types::general::ValidEmail;

pub(crate) fn optional_url(value: &str, _ctx: &()) -> garde::Result {
    if value.trim().is_empty() {
        return Ok(());
    }
    match url::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        Ok(_) => Err(garde::Error::new(
            "Enter the full URL, including 'http://' or 'https://', e.g., https://example.com",
        )),
        Err(e) => Err(garde::Error::new(format!("invalid URL: {e}"))),
    }
}

pub(crate) fn optional_email(value: &str, _ctx: &()) -> garde::Result {
    if value.trim().is_empty() {
        return Ok(());
    }
    value
        .parse::<ValidEmail>()
        .map(|_| ())
        .map_err(|_| garde::Error::new("invalid email address"))
}

pub(crate) fn latitude(value: &Option<f64>, _ctx: &()) -> garde::Result {
    match value {
        Some(v) if !(-90.0..=90.0).contains(v) => {
            Err(garde::Error::new("latitude must be between -90 and 90"))
        }
        _ => Ok(()),
    }
}

pub(crate) fn longitude(value: &Option<f64>, _ctx: &()) -> garde::Result {
    match value {
        Some(v) if !(-180.0..=180.0).contains(v) => {
            Err(garde::Error::new("longitude must be between -180 and 180"))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_url() {
        assert!(optional_url("", &()).is_ok());
        assert!(optional_url("https://duikclub.nl", &()).is_ok());
        assert!(optional_url("duikclub.nl", &()).is_err());
        assert!(optional_url("ftp://duikclub.nl", &()).is_err());
    }

    #[test]
    fn test_optional_email() {
        assert!(optional_email("", &()).is_ok());
        assert!(optional_email("info@duikclub.nl", &()).is_ok());
        assert!(optional_email("info", &()).is_err());
    }

    #[test]
    fn test_coordinates() {
        assert!(latitude(&None, &()).is_ok());
        assert!(latitude(&Some(51.5), &()).is_ok());
        assert!(latitude(&Some(91.0), &()).is_err());
        assert!(longitude(&Some(-180.0), &()).is_ok());
        assert!(longitude(&Some(180.5), &()).is_err());
    }
}
