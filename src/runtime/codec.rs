//! Entry points shared by every generated `serde` impl.
use serde::de::{DeserializeOwned, Error as _};
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::registry::Registry;
use crate::error::Error;

/// A type with a generated serialization companion.
///
/// The shadow mirrors the type with every polymorphic member replaced by an
/// [`Envelope`](super::Envelope) in the same container shape.
pub trait Shadowed: Sized {
    type Shadow: Serialize + DeserializeOwned;

    fn to_shadow(&self) -> Result<Self::Shadow, Error>;

    fn from_shadow(shadow: Self::Shadow, registry: &Registry) -> Result<Self, Error>;
}

pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Shadowed,
    S: Serializer,
{
    value.to_shadow().map_err(S::Error::custom)?.serialize(serializer)
}

/// Decodes through the process-wide registry.
pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: Shadowed,
    D: Deserializer<'de>,
{
    let shadow = T::Shadow::deserialize(deserializer)?;
    T::from_shadow(shadow, Registry::global()).map_err(D::Error::custom)
}

pub fn to_vec<T: Shadowed>(value: &T) -> Result<Vec<u8>, Error> {
    Ok(serde_json::to_vec(&value.to_shadow()?)?)
}

pub fn to_string<T: Shadowed>(value: &T) -> Result<String, Error> {
    Ok(serde_json::to_string(&value.to_shadow()?)?)
}

/// Like [`from_slice`] but against an explicit registry, keeping the error typed.
///
/// Marshalled types nested as plain members still decode through the global registry.
pub fn from_slice_in<T: Shadowed>(bytes: &[u8], registry: &Registry) -> Result<T, Error> {
    let shadow: T::Shadow = serde_json::from_slice(bytes)?;
    T::from_shadow(shadow, registry)
}

pub fn from_str_in<T: Shadowed>(src: &str, registry: &Registry) -> Result<T, Error> {
    let shadow: T::Shadow = serde_json::from_str(src)?;
    T::from_shadow(shadow, registry)
}

pub fn from_slice<T: Shadowed>(bytes: &[u8]) -> Result<T, Error> {
    from_slice_in(bytes, Registry::global())
}

pub fn from_str<T: Shadowed>(src: &str) -> Result<T, Error> {
    from_str_in(src, Registry::global())
}

/// Collects exactly `N` converted elements into an array.
pub fn try_array<U, const N: usize>(
    items: impl IntoIterator<Item = Result<U, Error>>,
) -> Result<[U; N], Error> {
    let items = items.into_iter().collect::<Result<Vec<U>, Error>>()?;
    let found = items.len();
    items.try_into().map_err(|_| Error::Length { expected: N, found })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{Discriminated, Envelope, Poly};
    use pretty_assertions::assert_eq;

    trait Note: Discriminated {
        fn text(&self) -> &str;
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Sticky {
        text: String,
    }

    impl Discriminated for Sticky {
        fn discriminator(&self) -> &str {
            "sticky"
        }
    }

    impl Note for Sticky {
        fn text(&self) -> &str {
            &self.text
        }
    }

    #[derive(Debug, PartialEq)]
    struct Board {
        title: String,
        notes: Option<Vec<Poly<dyn Note>>>,
    }

    #[derive(Serialize, Deserialize)]
    struct BoardShadow {
        title: String,
        notes: Option<Vec<Envelope>>,
    }

    impl Shadowed for Board {
        type Shadow = BoardShadow;

        fn to_shadow(&self) -> Result<BoardShadow, Error> {
            Ok(BoardShadow {
                title: self.title.clone(),
                notes: match &self.notes {
                    Some(v1) => Some(
                        v1.iter()
                            .map(|v2| Ok::<_, Error>(Envelope::wrap(v2)?))
                            .collect::<Result<Vec<_>, Error>>()?,
                    ),
                    None => None,
                },
            })
        }

        fn from_shadow(shadow: BoardShadow, registry: &Registry) -> Result<Self, Error> {
            Ok(Board {
                title: shadow.title,
                notes: match shadow.notes {
                    Some(v1) => Some(
                        v1.into_iter()
                            .map(|v2| Ok::<_, Error>(v2.open::<dyn Note>(registry, "Board.notes")?))
                            .collect::<Result<Vec<_>, Error>>()?,
                    ),
                    None => None,
                },
            })
        }
    }

    fn registry() -> Registry {
        let registry = Registry::new();
        registry.register_type::<Sticky>("sticky");
        registry.register_cast::<dyn Note, Sticky>(|v| -> Box<dyn Note> { v });
        registry
    }

    fn sticky(text: &str) -> Poly<dyn Note> {
        let note: Box<dyn Note> = Box::new(Sticky { text: text.to_owned() });
        note.into()
    }

    #[test]
    fn round_trip_through_explicit_registry() {
        let board = Board {
            title: String::from("todo"),
            notes: Some(vec![sticky("milk"), Poly::Nil, sticky("eggs")]),
        };
        let json = to_string(&board).unwrap();
        assert_eq!(
            json,
            r#"{"title":"todo","notes":[{"_type":"sticky","data":{"text":"milk"}},{"_type":"","data":null},{"_type":"sticky","data":{"text":"eggs"}}]}"#
        );
        let back: Board = from_str_in(&json, &registry()).unwrap();
        assert_eq!(back, board);
        assert_eq!(back.notes.unwrap()[2].get().map(|n| n.text().to_owned()), Some(String::from("eggs")));
    }

    #[test]
    fn nil_and_empty_containers_stay_apart() {
        for notes in [None, Some(Vec::new())] {
            let board = Board { title: String::new(), notes };
            let bytes = to_vec(&board).unwrap();
            let back: Board = from_slice_in(&bytes, &registry()).unwrap();
            assert_eq!(back, board);
        }
    }

    #[test]
    fn shadow_errors_pass_through_unchanged() {
        let err = from_str_in::<Board>(r#"{"title": 7}"#, &registry()).unwrap_err();
        assert!(matches!(err, Error::Json(_)), "{err}");
    }

    #[test]
    fn missing_registration_fails_the_whole_value() {
        let src = r#"{"title":"x","notes":[{"_type":"sticky","data":{"text":"a"}},{"_type":"memo","data":{}}]}"#;
        let err = from_str_in::<Board>(src, &registry()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "no constructor registered for discriminator `memo`"
        );
    }

    #[test]
    fn fixed_arrays_need_the_exact_length() {
        let ok: [u8; 2] = try_array([Ok(1), Ok(2)]).unwrap();
        assert_eq!(ok, [1, 2]);
        let err = try_array::<u8, 3>([Ok(1), Ok(2)]).unwrap_err();
        assert!(matches!(err, Error::Length { expected: 3, found: 2 }));
    }
}
