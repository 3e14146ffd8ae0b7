//! Tag-list parser (component A): decodes `k=v; k=v; ...` into an ordered
//! sequence of `Tag`s. Uses `nom` for the grammar, matching this corpus's
//! chosen parser-combinator crate for the same job.

use nom::{
    bytes::complete::{is_not, tag},
    character::complete::{char, multispace0},
    combinator::{map, opt},
    multi::separated_list1,
    sequence::{preceded, terminated, tuple},
    IResult,
};

use crate::errors::DKIMError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

fn tag_name(input: &str) -> IResult<&str, &str> {
    is_not(" \t\r\n=;")(input)
}

fn tag_value(input: &str) -> IResult<&str, &str> {
    // A value runs up to the next `;` (or end of input); it may be empty.
    match is_not(";")(input) {
        Ok(ok) => Ok(ok),
        Err(_) => Ok((input, "")),
    }
}

fn one_tag(input: &str) -> IResult<&str, Tag> {
    map(
        tuple((
            preceded(multispace0, tag_name),
            preceded(multispace0, char('=')),
            terminated(tag_value, multispace0),
        )),
        |(name, _, value)| Tag {
            name: name.trim().to_string(),
            value: value.trim().to_string(),
        },
    )(input)
}

/// Parse `key = value ( ";" key = value )*`, trimming whitespace around
/// both key and value, and tolerating a trailing `;`.
pub fn tag_list(input: &str) -> IResult<&str, Vec<Tag>> {
    terminated(
        separated_list1(char(';'), one_tag),
        opt(preceded(multispace0, char(';'))),
    )(input)
}

/// Parse a tag-value list into an order-preserving map. Fails with
/// `InvalidTagList` on a duplicate key or a malformed (no `=`) entry.
pub fn parse(input: &str) -> Result<indexmap::IndexMap<String, String>, DKIMError> {
    let (rest, tags) = tag_list(input)
        .map_err(|err| DKIMError::InvalidTagList(format!("malformed tag-value list: {}", err)))?;
    if !rest.trim().is_empty() {
        return Err(DKIMError::InvalidTagList(format!(
            "unexpected trailing content: {:?}",
            rest
        )));
    }

    let mut map = indexmap::IndexMap::new();
    for t in tags {
        if map.insert(t.name.clone(), t.value).is_some() {
            return Err(DKIMError::InvalidTagList(format!(
                "duplicate tag {}",
                t.name
            )));
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple() {
        let map = parse("v=1; a=rsa-sha256; d=example.com").unwrap();
        assert_eq!(map.get("v").unwrap(), "1");
        assert_eq!(map.get("a").unwrap(), "rsa-sha256");
        assert_eq!(map.get("d").unwrap(), "example.com");
    }

    #[test]
    fn test_preserves_order() {
        let map = parse("z=1; a=2; m=3").unwrap();
        let keys: Vec<&str> = map.keys().map(|s| s.as_str()).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_trims_whitespace() {
        let map = parse("  v = 1 ;   a = rsa-sha256  ").unwrap();
        assert_eq!(map.get("v").unwrap(), "1");
        assert_eq!(map.get("a").unwrap(), "rsa-sha256");
    }

    #[test]
    fn test_trailing_semicolon_ok() {
        let map = parse("v=1;").unwrap();
        assert_eq!(map.get("v").unwrap(), "1");
    }

    #[test]
    fn test_folded_whitespace_in_value() {
        let map = parse("b=abc\r\n  def").unwrap();
        assert_eq!(map.get("b").unwrap(), "abc\r\n  def");
    }

    #[test]
    fn test_duplicate_key_errors() {
        let err = parse("v=1; v=2").unwrap_err();
        assert!(matches!(err, DKIMError::InvalidTagList(_)));
    }

    #[test]
    fn test_missing_equals_errors() {
        let err = parse("v=1; garbage").unwrap_err();
        assert!(matches!(err, DKIMError::InvalidTagList(_)));
    }

    #[test]
    fn test_empty_value_allowed() {
        let map = parse("b=").unwrap();
        assert_eq!(map.get("b").unwrap(), "");
    }
}
