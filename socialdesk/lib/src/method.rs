//! HTTP verbs used by the console.

use strum::{Display, EnumIter, EnumString};

/// The five verbs the console API speaks.
///
/// `Patch` updates part of a record, `Put` replaces it.
///
/// ## Examples
///
/// ```rust
/// use socialdesk_lib::RestMethod;
///
/// let parsed: RestMethod = "PATCH".parse().unwrap();
/// assert_eq!(parsed, RestMethod::Patch);
/// assert_eq!(parsed.to_string(), "PATCH");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum RestMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl RestMethod {
    /// Returns the `reqwest` method for this verb.
    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl From<RestMethod> for reqwest::Method {
    fn from(verb: RestMethod) -> Self {
        verb.to_reqwest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn names_match_the_wire_form() {
        for verb in RestMethod::iter() {
            assert_eq!(reqwest::Method::from(verb).as_str(), verb.to_string());
        }
    }

    #[test]
    fn unknown_verbs_do_not_parse() {
        assert!("OPTIONS".parse::<RestMethod>().is_err());
        assert_eq!("DELETE".parse::<RestMethod>().unwrap(), RestMethod::Delete);
    }
}
