//! Radix tree nodes.
//!
//! Each node stands for one path segment. Static children are kept sorted
//! for binary search; a node has at most one parameter child and at most one
//! wildcard child.

use std::fmt;

use regex::Regex;

use crate::error::RouteError;
use crate::method_router::MethodRouter;
use crate::params::Params;

/// A compiled `{name:regex}` constraint. The regex must match the whole
/// segment.
#[derive(Clone)]
pub struct Constraint {
    source: String,
    regex: Regex,
}

impl Constraint {
    fn compile(path: &str, source: &str) -> Result<Self, RouteError> {
        let regex = Regex::new(&format!("^(?:{source})$")).map_err(|e| {
            RouteError::InvalidConstraint {
                path: path.to_string(),
                pattern: source.to_string(),
                source: e,
            }
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// The regex as written in the route pattern.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True if the whole segment satisfies the constraint.
    #[must_use]
    pub fn is_match(&self, segment: &str) -> bool {
        self.regex.is_match(segment)
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Constraint {}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Constraint").field(&self.source).finish()
    }
}

/// Kind of path segment a node represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Literal segment, e.g. `orders`.
    Static,
    /// Captured segment, e.g. `{id}` or `{id:[0-9]+}`.
    Param {
        /// Capture name.
        name: String,
        /// Optional whole-segment regex.
        constraint: Option<Constraint>,
    },
    /// Catch-all for the rest of the path, e.g. `*file`.
    Wildcard(String),
}

/// A node of the radix tree.
#[derive(Debug, Clone)]
pub(crate) struct Node<T> {
    segment: String,
    kind: SegmentKind,
    methods: Option<MethodRouter<T>>,
    static_children: Vec<Node<T>>,
    param_child: Option<Box<Node<T>>>,
    wildcard_child: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    fn new(segment: String, kind: SegmentKind) -> Self {
        Self {
            segment,
            kind,
            methods: None,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    pub(crate) fn root() -> Self {
        Self::new(String::new(), SegmentKind::Static)
    }

    /// Inserts `methods` at `path`, merging with any registrations already
    /// at that node. On error the tree is left untouched.
    pub(crate) fn insert(
        &mut self,
        path: &str,
        methods: MethodRouter<T>,
    ) -> Result<(), RouteError> {
        let segments = parse_path(path)?;
        self.check_segments(path, &segments, &methods)?;
        self.insert_segments(&segments, methods);
        Ok(())
    }

    /// Walks the existing tree along `segments` without modifying it and
    /// reports the first conflict the insertion would hit.
    fn check_segments(
        &self,
        path: &str,
        segments: &[(String, SegmentKind)],
        methods: &MethodRouter<T>,
    ) -> Result<(), RouteError> {
        let Some(((segment, kind), rest)) = segments.split_first() else {
            return self.check_attach(path, methods);
        };

        let child = match kind {
            SegmentKind::Static => self
                .static_children
                .binary_search_by(|c| c.segment.as_str().cmp(segment))
                .ok()
                .map(|idx| &self.static_children[idx]),
            SegmentKind::Param { .. } => self.param_child.as_deref(),
            SegmentKind::Wildcard(_) => self.wildcard_child.as_deref(),
        };
        let Some(child) = child else {
            return Ok(());
        };
        if child.kind != *kind {
            return Err(RouteError::ParamConflict {
                path: path.to_string(),
                existing: child.segment.clone(),
                new: segment.clone(),
            });
        }
        child.check_segments(path, rest, methods)
    }

    fn check_attach(&self, path: &str, methods: &MethodRouter<T>) -> Result<(), RouteError> {
        let Some(existing) = &self.methods else {
            return Ok(());
        };
        match existing.overlaps(methods).into_iter().next() {
            Some(Some(method)) => Err(RouteError::Duplicate {
                method,
                path: path.to_string(),
            }),
            Some(None) => Err(RouteError::DuplicateFallback {
                path: path.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn insert_segments(&mut self, segments: &[(String, SegmentKind)], methods: MethodRouter<T>) {
        let Some(((segment, kind), rest)) = segments.split_first() else {
            match &mut self.methods {
                Some(existing) => existing.merge(methods),
                None => self.methods = Some(methods),
            }
            return;
        };

        let new_child = || Node::new(segment.clone(), kind.clone());
        let child = match kind {
            SegmentKind::Static => {
                let idx = match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment))
                {
                    Ok(idx) => idx,
                    Err(idx) => {
                        self.static_children.insert(idx, new_child());
                        idx
                    }
                };
                &mut self.static_children[idx]
            }
            SegmentKind::Param { .. } => {
                &mut **self.param_child.get_or_insert_with(|| Box::new(new_child()))
            }
            SegmentKind::Wildcard(_) => {
                &mut **self.wildcard_child.get_or_insert_with(|| Box::new(new_child()))
            }
        };
        child.insert_segments(rest, methods);
    }

    /// Finds the endpoint for `path`, capturing parameters on the way.
    pub(crate) fn match_path(&self, path: &str) -> Option<(&MethodRouter<T>, Params)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let methods = self.match_segments(&segments, &mut params)?;
        Some((methods, params))
    }

    fn match_segments<'a>(
        &'a self,
        segments: &[&str],
        params: &mut Params,
    ) -> Option<&'a MethodRouter<T>> {
        let Some((segment, rest)) = segments.split_first() else {
            return self.methods.as_ref();
        };

        if let Ok(idx) = self
            .static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
        {
            if let Some(found) = self.static_children[idx].match_segments(rest, params) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param_child {
            if let SegmentKind::Param { name, constraint } = &child.kind {
                let accepted = constraint.as_ref().map_or(true, |c| c.is_match(segment));
                if accepted {
                    let mark = params.len();
                    params.push(name.as_str(), *segment);
                    if let Some(found) = child.match_segments(rest, params) {
                        return Some(found);
                    }
                    params.truncate(mark);
                }
            }
        }

        if let Some(child) = &self.wildcard_child {
            if let (SegmentKind::Wildcard(name), Some(methods)) = (&child.kind, &child.methods) {
                params.push(name.as_str(), segments.join("/"));
                return Some(methods);
            }
        }

        None
    }
}

/// Splits a route pattern into typed segments, rejecting every syntax
/// error before the tree is touched.
fn parse_path(path: &str) -> Result<Vec<(String, SegmentKind)>, RouteError> {
    let segments: Vec<(String, SegmentKind)> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| parse_segment(path, s).map(|kind| (s.to_string(), kind)))
        .collect::<Result<_, _>>()?;

    let wildcard_inside = segments
        .iter()
        .rev()
        .skip(1)
        .any(|(_, kind)| matches!(kind, SegmentKind::Wildcard(_)));
    if wildcard_inside {
        return Err(RouteError::WildcardNotLast {
            path: path.to_string(),
        });
    }
    Ok(segments)
}

fn parse_segment(path: &str, segment: &str) -> Result<SegmentKind, RouteError> {
    let malformed = || RouteError::MalformedSegment {
        path: path.to_string(),
        segment: segment.to_string(),
    };

    if let Some(inner) = segment.strip_prefix('{') {
        let inner = inner.strip_suffix('}').ok_or_else(malformed)?;
        let (name, constraint) = match inner.split_once(':') {
            Some((name, pattern)) => (name, Some(Constraint::compile(path, pattern)?)),
            None => (inner, None),
        };
        if name.is_empty() {
            return Err(malformed());
        }
        return Ok(SegmentKind::Param {
            name: name.to_string(),
            constraint,
        });
    }

    if let Some(name) = segment.strip_prefix('*') {
        if name.is_empty() {
            return Err(malformed());
        }
        return Ok(SegmentKind::Wildcard(name.to_string()));
    }

    if segment.contains(['{', '}']) {
        return Err(malformed());
    }
    Ok(SegmentKind::Static)
}
