use std::collections::btree_map;
use std::collections::BTreeMap;
use std::str::FromStr;

use nom::branch::alt;
use nom::bytes::complete::escaped;
use nom::bytes::complete::tag;
use nom::bytes::complete::take_while1;
use nom::character::complete::multispace0;
use nom::character::complete::none_of;
use nom::error::ParseError;
use nom::multi::separated_list0;
use nom::sequence::delimited;
use nom::sequence::separated_pair;
use nom::IResult;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;

/// Key/value device arguments, e.g. `driver=sdrplay, serial=1234`.
///
/// Used for device selector strings as well as for the metadata records
/// returned by device enumeration. Keys are kept sorted so that diagnostic
/// output is stable across runs.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kwargs {
    map: BTreeMap<String, String>,
}

impl Kwargs {
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }
    /// Get the value for `key`, parsed into `V`.
    pub fn get<V: FromStr<Err = impl std::error::Error>>(
        &self,
        key: impl AsRef<str>,
    ) -> Result<V, Error> {
        self.map
            .get(key.as_ref())
            .ok_or(Error::NotFound)
            .and_then(|v| v.parse().or(Err(Error::ValueError)))
    }
    /// Insert a key/value pair, returning the previous value, if any.
    pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) -> Option<String> {
        self.map.insert(key.into(), value.into())
    }
    pub fn contains(&self, key: impl AsRef<str>) -> bool {
        self.map.contains_key(key.as_ref())
    }
    pub fn len(&self) -> usize {
        self.map.len()
    }
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.map.iter()
    }
    /// Deserialize the arguments into a typed struct.
    pub fn deserialize<D: for<'a> Deserialize<'a>>(&self) -> Option<D> {
        let s = serde_json::to_string(&self).ok()?;
        serde_json::from_str(&s).ok()
    }
}

impl std::fmt::Debug for Kwargs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.map.fmt(f)
    }
}

impl std::fmt::Display for Kwargs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut entries = self.iter();
        if let Some((k, v)) = entries.next() {
            write!(f, "{}={}", k, v)?;
            for (k, v) in entries {
                write!(f, ", {}={}", k, v)?;
            }
        }
        Ok(())
    }
}

/// A single value: quoted (with escapes) or a bare word without `,`, `=` or
/// whitespace.
fn parse_value<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
where
    E: ParseError<&'a str> + std::fmt::Debug,
{
    let esc_single = escaped(none_of("\\\'"), '\\', tag("'"));
    let esc_or_empty_single = alt((esc_single, tag("")));
    let esc_double = escaped(none_of("\\\""), '\\', tag("\""));
    let esc_or_empty_double = alt((esc_double, tag("")));
    let bare = |c: char| c != ',' && c != '=' && !c.is_whitespace();

    delimited(
        multispace0,
        alt((
            delimited(tag("'"), esc_or_empty_single, tag("'")),
            delimited(tag("\""), esc_or_empty_double, tag("\"")),
            take_while1(bare),
        )),
        multispace0,
    )(input)
}

impl FromStr for Kwargs {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, pairs) = separated_list0(
            delimited(multispace0, tag(","), multispace0),
            separated_pair(
                parse_value::<nom::error::Error<_>>,
                delimited(multispace0, tag("="), multispace0),
                parse_value,
            ),
        )(s)
        .or(Err(Error::ValueError))?;
        Ok(Kwargs {
            map: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }
}

impl TryFrom<&str> for Kwargs {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for Kwargs {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
