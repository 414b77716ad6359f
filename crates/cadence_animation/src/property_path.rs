//! Property paths
//!
//! A property path locates the `(object, property)` pair an animation writes,
//! starting from the animation's target object.
//!
//! # Grammar
//!
//! ```text
//! path    := segment ('.' segment)*
//! segment := member ('[' integer ']')*
//! member  := identifier | '(' identifier ')' | '(' Type '.' identifier ')'
//! ```
//!
//! - A bare `identifier` is looked up on the runtime type of the object it is
//!   applied to. It may only traverse into a sub-object when followed by an
//!   indexer (`Children[0]`); otherwise it must be the final segment.
//! - `(Type.Member)` names the declaring type explicitly and may appear at any
//!   position. This is how attached properties (`(Canvas.Left)`) and
//!   properties of sub-objects (`(Control.Background).(SolidColorBrush.Color)`)
//!   are reached.
//! - A path made of exactly `Type.Member` is shorthand for `(Type.Member)`.
//!
//! Resolution only reads the object graph.

use cadence_core::{ObjectId, ObjectRef, PropertyId, Value};
use nom::{
    branch::alt,
    bytes::complete::take_while,
    character::complete::{char, digit1, multispace0, satisfy},
    combinator::{all_consuming, cut, map, map_res, opt, recognize},
    error::{context, VerboseError, VerboseErrorKind},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded},
    Finish, IResult,
};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

use crate::error::PathError;

type ParseResult<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

// ============================================================================
// Parsed form
// ============================================================================

/// The member named by one path segment
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Member {
    /// Unparenthesized identifier
    Bare(String),
    /// Parenthesized member, optionally qualified by its declaring type
    Qualified { owner: Option<String>, name: String },
}

impl Member {
    pub fn name(&self) -> &str {
        match self {
            Member::Bare(name) => name,
            Member::Qualified { name, .. } => name,
        }
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Bare(name) => write!(f, "{name}"),
            Member::Qualified {
                owner: Some(owner),
                name,
            } => write!(f, "({owner}.{name})"),
            Member::Qualified { owner: None, name } => write!(f, "({name})"),
        }
    }
}

/// One `.`-separated segment of a path
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathSegment {
    pub member: Member,
    pub indices: SmallVec<[usize; 2]>,
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.member)?;
        for index in &self.indices {
            write!(f, "[{index}]")?;
        }
        Ok(())
    }
}

// ============================================================================
// Parser
// ============================================================================

fn identifier(input: &str) -> ParseResult<&str> {
    context(
        "identifier",
        recognize(pair(
            satisfy(|c: char| c.is_alphabetic() || c == '_'),
            take_while(|c: char| c.is_alphanumeric() || c == '_'),
        )),
    )(input)
}

/// `(Type.Member)` or `(Member)`
fn qualified_member(input: &str) -> ParseResult<Member> {
    context(
        "parenthesized member",
        map(
            delimited(
                char('('),
                cut(pair(identifier, opt(preceded(char('.'), identifier)))),
                cut(char(')')),
            ),
            |(first, second)| match second {
                Some(name) => Member::Qualified {
                    owner: Some(first.to_string()),
                    name: name.to_string(),
                },
                None => Member::Qualified {
                    owner: None,
                    name: first.to_string(),
                },
            },
        ),
    )(input)
}

fn member(input: &str) -> ParseResult<Member> {
    alt((
        qualified_member,
        map(identifier, |name| Member::Bare(name.to_string())),
    ))(input)
}

fn indexer(input: &str) -> ParseResult<usize> {
    context(
        "indexer",
        delimited(
            char('['),
            cut(map_res(digit1, str::parse::<usize>)),
            cut(char(']')),
        ),
    )(input)
}

fn segment(input: &str) -> ParseResult<PathSegment> {
    map(pair(member, many0(indexer)), |(member, indices)| PathSegment {
        member,
        indices: SmallVec::from_vec(indices),
    })(input)
}

fn path(input: &str) -> ParseResult<Vec<PathSegment>> {
    all_consuming(delimited(
        multispace0,
        separated_list1(char('.'), segment),
        multispace0,
    ))(input)
}

/// Parse path text into segments
pub fn parse_path(text: &str) -> Result<Vec<PathSegment>, PathError> {
    match path(text).finish() {
        Ok((_, segments)) => Ok(segments),
        Err(err) => {
            let (position, message) = describe_error(text, &err);
            tracing::debug!(path = text, position, %message, "property path rejected");
            Err(PathError::Syntax {
                path: text.to_string(),
                position,
                message,
            })
        }
    }
}

fn describe_error(text: &str, err: &VerboseError<&str>) -> (usize, String) {
    let position = err
        .errors
        .first()
        .map(|(rest, _)| text.len().saturating_sub(rest.len()))
        .unwrap_or(0);
    let expected = err.errors.iter().find_map(|(_, kind)| match kind {
        VerboseErrorKind::Context(ctx) => Some(format!("expected {ctx}")),
        VerboseErrorKind::Char(c) => Some(format!("expected '{c}'")),
        VerboseErrorKind::Nom(_) => None,
    });
    let message = expected.unwrap_or_else(|| "unexpected input".to_string());
    (position, message)
}

// ============================================================================
// PropertyPath
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
enum PathSource {
    Text(String),
    Property(PropertyId),
}

/// A path from a target object to the property an animation drives
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyPath {
    source: PathSource,
}

impl PropertyPath {
    /// A path given as text; syntax errors surface when it is resolved
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            source: PathSource::Text(path.into()),
        }
    }

    /// A path naming a registered property directly on the target
    pub fn from_property(property: PropertyId) -> Self {
        Self {
            source: PathSource::Property(property),
        }
    }

    /// The path text, `None` for property-id paths
    pub fn text(&self) -> Option<&str> {
        match &self.source {
            PathSource::Text(text) => Some(text),
            PathSource::Property(_) => None,
        }
    }

    pub fn property(&self) -> Option<PropertyId> {
        match &self.source {
            PathSource::Property(id) => Some(*id),
            PathSource::Text(_) => None,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        matches!(&self.source, PathSource::Text(text) if text.trim().is_empty())
    }

    /// Resolve against `root`, returning the location to write
    pub fn resolve(&self, root: &ObjectRef) -> Result<PropertyTarget, PathError> {
        match &self.source {
            PathSource::Property(id) => {
                let registry = root.registry();
                if !registry.applies_to(*id, root.type_name()) {
                    let property = registry
                        .property(*id)
                        .map(|info| info.qualified_name())
                        .unwrap_or_else(|| format!("#{}", id.index()));
                    return Err(PathError::PropertyNotApplicable {
                        type_name: root.type_name().to_string(),
                        property,
                    });
                }
                Ok(PropertyTarget::new(Arc::clone(root), *id))
            }
            PathSource::Text(text) => {
                let segments = parse_path(text)?;
                resolve_segments(root, segments)
            }
        }
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            PathSource::Text(text) => write!(f, "{text}"),
            PathSource::Property(id) => write!(f, "#{}", id.index()),
        }
    }
}

impl From<&str> for PropertyPath {
    fn from(path: &str) -> Self {
        PropertyPath::new(path)
    }
}

impl From<String> for PropertyPath {
    fn from(path: String) -> Self {
        PropertyPath::new(path)
    }
}

impl From<PropertyId> for PropertyPath {
    fn from(property: PropertyId) -> Self {
        PropertyPath::from_property(property)
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// A resolved, writable property location
#[derive(Clone, Debug)]
pub struct PropertyTarget {
    pub object: ObjectRef,
    pub property: PropertyId,
}

impl PropertyTarget {
    pub fn new(object: ObjectRef, property: PropertyId) -> Self {
        Self { object, property }
    }

    pub fn get(&self) -> Value {
        self.object.get_value(self.property)
    }

    pub fn set(&self, value: Value) -> cadence_core::Result<()> {
        self.object.set_value(self.property, value)
    }

    /// Identity of the location
    pub fn key(&self) -> (ObjectId, PropertyId) {
        (self.object.id(), self.property)
    }

    pub(crate) fn describe(&self) -> String {
        let property = self
            .object
            .registry()
            .property(self.property)
            .map(|info| info.qualified_name())
            .unwrap_or_else(|| format!("#{}", self.property.index()));
        match self.object.name() {
            Some(name) => format!("{property} of {} '{name}'", self.object.type_name()),
            None => format!("{property} of a {}", self.object.type_name()),
        }
    }
}

impl PartialEq for PropertyTarget {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.object, &other.object) && self.property == other.property
    }
}

impl Eq for PropertyTarget {}

fn resolve_segments(
    root: &ObjectRef,
    mut segments: Vec<PathSegment>,
) -> Result<PropertyTarget, PathError> {
    let registry = Arc::clone(root.registry());

    // `Type.Member` on its own reads as `(Type.Member)`
    if let [first, second] = segments.as_slice() {
        if let (Member::Bare(owner), Member::Bare(name)) = (&first.member, &second.member) {
            if first.indices.is_empty() && second.indices.is_empty() && registry.has_type(owner) {
                segments = vec![PathSegment {
                    member: Member::Qualified {
                        owner: Some(owner.clone()),
                        name: name.clone(),
                    },
                    indices: SmallVec::new(),
                }];
            }
        }
    }

    let last = segments.len() - 1;
    let mut current = Arc::clone(root);
    for (position, segment) in segments.iter().enumerate() {
        let is_final = position == last;
        let type_name = current.type_name().to_string();

        let property = match &segment.member {
            Member::Bare(name) if !is_final && segment.indices.is_empty() => {
                return Err(PathError::NonFinalBareSegment(name.clone()));
            }
            Member::Bare(name) | Member::Qualified { owner: None, name } => registry
                .find_property(&type_name, name)
                .ok_or_else(|| PathError::UnknownMember {
                    type_name: type_name.clone(),
                    member: name.clone(),
                })?,
            Member::Qualified {
                owner: Some(owner),
                name,
            } => {
                if !registry.has_type(owner) {
                    return Err(PathError::UnknownType(owner.clone()));
                }
                let property =
                    registry
                        .lookup(owner, name)
                        .ok_or_else(|| PathError::UnknownMember {
                            type_name: owner.clone(),
                            member: name.clone(),
                        })?;
                if !registry.applies_to(property, &type_name) {
                    return Err(PathError::TypeMismatch {
                        type_name,
                        owner: owner.clone(),
                        member: name.clone(),
                    });
                }
                property
            }
        };

        if is_final {
            if !segment.indices.is_empty() {
                return Err(PathError::IndexedFinalSegment(segment.to_string()));
            }
            return Ok(PropertyTarget::new(current, property));
        }

        let mut next = match current.get_value(property) {
            Value::Object(obj) => obj,
            Value::Null => return Err(PathError::NullIntermediate(segment.member.to_string())),
            _ => return Err(PathError::NotAnObject(segment.member.to_string())),
        };
        for &index in &segment.indices {
            if !next.is_container() {
                return Err(PathError::NotIndexable(segment.member.to_string()));
            }
            let len = next.item_count();
            next = next.item(index).ok_or_else(|| PathError::IndexOutOfRange {
                member: segment.member.to_string(),
                index,
                len,
            })?;
        }
        current = next;
    }

    unreachable!("a parsed path has at least one segment")
}
