use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

/// An untyped (JSON) Object from which [TypedParameters](TypedParameter) can be parsed.
///
/// Holds the properties of a presentation or credential that have no dedicated field,
/// such as an embedded `presentation_submission`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(transparent)]
pub struct UntypedObject(pub(crate) Map<String, Json>);

/// A strongly typed property that can be read from an [UntypedObject].
pub trait TypedParameter:
    TryFrom<Json, Error = anyhow::Error> + TryInto<Json> + Clone + std::fmt::Debug
{
    const KEY: &'static str;
}

impl UntypedObject {
    /// Get a [TypedParameter] from the Object.
    ///
    /// Note that this method clones the underlying data.
    pub fn get<T: TypedParameter>(&self) -> Option<Result<T>> {
        Some(self.0.get(T::KEY)?.clone().try_into().map_err(Into::into))
    }

    /// Insert a [TypedParameter], returning the raw value it replaced.
    pub fn insert<T: TypedParameter>(&mut self, t: T) -> Result<Option<Json>> {
        let value: Json = t
            .try_into()
            .map_err(|_| anyhow::anyhow!("failed to serialize '{}'", T::KEY))?;
        Ok(self.0.insert(T::KEY.to_owned(), value))
    }

    /// Get a raw property.
    pub fn get_raw(&self, key: &str) -> Option<&Json> {
        self.0.get(key)
    }

    /// Insert a raw property, returning the value it replaced.
    pub fn insert_raw(&mut self, key: impl Into<String>, value: Json) -> Option<Json> {
        self.0.insert(key.into(), value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Json>> for UntypedObject {
    fn from(value: Map<String, Json>) -> Self {
        Self(value)
    }
}

impl From<UntypedObject> for Json {
    fn from(value: UntypedObject) -> Self {
        value.0.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    struct Nonce(String);

    impl TypedParameter for Nonce {
        const KEY: &'static str = "nonce";
    }

    impl TryFrom<Json> for Nonce {
        type Error = anyhow::Error;

        fn try_from(value: Json) -> Result<Self> {
            Ok(Self(serde_json::from_value(value)?))
        }
    }

    impl From<Nonce> for Json {
        fn from(value: Nonce) -> Self {
            Json::String(value.0)
        }
    }

    #[test]
    fn typed_round_trip() {
        let mut object = UntypedObject::default();
        assert!(object.get::<Nonce>().is_none());
        assert!(object.insert(Nonce("n-0S6_WzA2Mj".into())).unwrap().is_none());
        assert_eq!(
            object.get::<Nonce>().unwrap().unwrap(),
            Nonce("n-0S6_WzA2Mj".into())
        );
        assert_eq!(object.get_raw("nonce"), Some(&json!("n-0S6_WzA2Mj")));
    }

    #[test]
    fn wrong_shape_is_an_error() {
        let object: UntypedObject = serde_json::from_value(json!({ "nonce": 7 })).unwrap();
        assert!(object.get::<Nonce>().unwrap().is_err());
    }
}
