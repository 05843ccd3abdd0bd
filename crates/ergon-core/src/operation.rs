//! The five canonical resource operations.
//!
//! Every operation maps to one HTTP method and one path shape. Collection
//! operations ([`Create`](EntityOperation::Create),
//! [`GetList`](EntityOperation::GetList)) live on the collection path; item
//! operations ([`Get`](EntityOperation::Get),
//! [`Update`](EntityOperation::Update), [`Delete`](EntityOperation::Delete))
//! live on `collection/{id:[0-9]+}`.

use std::fmt;
use std::str::FromStr;

use http::Method;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the identifier path parameter.
pub const ID_PARAM: &str = "id";

/// Regex every identifier segment must match.
pub const ID_PATTERN: &str = "[0-9]+";

/// A canonical resource action.
///
/// ```
/// use ergon_core::EntityOperation;
/// use http::Method;
///
/// assert_eq!(EntityOperation::Create.http_method(), Method::POST);
/// assert_eq!(EntityOperation::Create.build_path("/widgets", ""), "/widgets");
/// assert_eq!(
///     EntityOperation::Update.build_path("/widgets", ""),
///     "/widgets/{id:[0-9]+}"
/// );
/// assert_eq!(
///     EntityOperation::Create.build_path("/items", "/orders"),
///     "/orders/items"
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityOperation {
    /// Create a member of the collection.
    Create,
    /// Replace one member.
    Update,
    /// Remove one member.
    Delete,
    /// Read one member.
    Get,
    /// Read the collection.
    GetList,
}

impl EntityOperation {
    /// All operations in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Create,
        Self::Update,
        Self::Delete,
        Self::Get,
        Self::GetList,
    ];

    /// The HTTP method this operation is served on.
    #[must_use]
    pub fn http_method(self) -> Method {
        match self {
            Self::Create => Method::POST,
            Self::Update => Method::PUT,
            Self::Delete => Method::DELETE,
            Self::Get | Self::GetList => Method::GET,
        }
    }

    /// True for operations addressed at a single member.
    #[must_use]
    pub const fn requires_id(self) -> bool {
        matches!(self, Self::Get | Self::Update | Self::Delete)
    }

    /// Stable snake_case name, as used in logs and serialized forms.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Get => "get",
            Self::GetList => "get_list",
        }
    }

    /// Builds the route pattern for this operation.
    ///
    /// With a non-empty `prefix` the collection path is `prefix/base_path`,
    /// otherwise just `base_path`. Item operations append the
    /// `{id:[0-9]+}` segment.
    #[must_use]
    pub fn build_path(self, base_path: &str, prefix: &str) -> String {
        let collection = join_path(prefix, base_path);
        if !self.requires_id() {
            return collection;
        }
        let id = format!("{{{ID_PARAM}:{ID_PATTERN}}}");
        if collection == "/" {
            format!("/{id}")
        } else {
            format!("{collection}/{id}")
        }
    }
}

impl fmt::Display for EntityOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string names no operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown entity operation `{0}`")]
pub struct ParseOperationError(String);

impl FromStr for EntityOperation {
    type Err = ParseOperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "get" => Ok(Self::Get),
            "get_list" | "getlist" => Ok(Self::GetList),
            _ => Err(ParseOperationError(s.to_string())),
        }
    }
}

/// Joins two path fragments with a single `/`, dropping empty segments.
///
/// The result always starts with `/` and never ends with one, except for
/// the root path itself.
///
/// ```
/// use ergon_core::join_path;
///
/// assert_eq!(join_path("/orders", "/items"), "/orders/items");
/// assert_eq!(join_path("", "widgets/"), "/widgets");
/// assert_eq!(join_path("", "/"), "/");
/// ```
#[must_use]
pub fn join_path(prefix: &str, path: &str) -> String {
    let joined = prefix
        .split('/')
        .chain(path.split('/'))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    format!("/{joined}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_http_methods() {
        assert_eq!(EntityOperation::Create.http_method(), Method::POST);
        assert_eq!(EntityOperation::Update.http_method(), Method::PUT);
        assert_eq!(EntityOperation::Delete.http_method(), Method::DELETE);
        assert_eq!(EntityOperation::Get.http_method(), Method::GET);
        assert_eq!(EntityOperation::GetList.http_method(), Method::GET);
    }

    #[test]
    fn test_collection_paths() {
        assert_eq!(EntityOperation::Create.build_path("/widgets", ""), "/widgets");
        assert_eq!(EntityOperation::GetList.build_path("/widgets", ""), "/widgets");
    }

    #[test]
    fn test_item_paths() {
        for op in [
            EntityOperation::Get,
            EntityOperation::Update,
            EntityOperation::Delete,
        ] {
            assert_eq!(op.build_path("/widgets", ""), "/widgets/{id:[0-9]+}");
        }
    }

    #[test]
    fn test_prefixed_paths() {
        assert_eq!(
            EntityOperation::Create.build_path("/items", "/orders"),
            "/orders/items"
        );
        assert_eq!(
            EntityOperation::Get.build_path("items", "/orders/"),
            "/orders/items/{id:[0-9]+}"
        );
    }

    #[test]
    fn test_root_base_path() {
        assert_eq!(EntityOperation::GetList.build_path("/", ""), "/");
        assert_eq!(EntityOperation::Delete.build_path("/", ""), "/{id:[0-9]+}");
    }

    #[test]
    fn test_parse_and_display() {
        for op in EntityOperation::ALL {
            assert_eq!(op.to_string().parse::<EntityOperation>(), Ok(op));
        }
        assert_eq!("GetList".parse(), Ok(EntityOperation::GetList));
        assert!("patch".parse::<EntityOperation>().is_err());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&EntityOperation::GetList).unwrap();
        assert_eq!(json, "\"get_list\"");
        let op: EntityOperation = serde_json::from_str("\"delete\"").unwrap();
        assert_eq!(op, EntityOperation::Delete);
    }

    fn segment() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_-]{0,8}"
    }

    proptest! {
        #[test]
        fn prop_collection_ops_never_append_id(
            base in prop::collection::vec(segment(), 1..4),
            prefix in prop::collection::vec(segment(), 0..3),
        ) {
            let base = format!("/{}", base.join("/"));
            let prefix = if prefix.is_empty() { String::new() } else { format!("/{}", prefix.join("/")) };
            for op in [EntityOperation::Create, EntityOperation::GetList] {
                let path = op.build_path(&base, &prefix);
                prop_assert!(!path.contains('{'), "path {} contains a placeholder", path);
                prop_assert!(path.ends_with(base.as_str()));
            }
        }

        #[test]
        fn prop_item_ops_append_one_numeric_id(
            base in prop::collection::vec(segment(), 1..4),
            prefix in prop::collection::vec(segment(), 0..3),
        ) {
            let base = format!("/{}", base.join("/"));
            let prefix = if prefix.is_empty() { String::new() } else { format!("/{}", prefix.join("/")) };
            for op in [EntityOperation::Get, EntityOperation::Update, EntityOperation::Delete] {
                let path = op.build_path(&base, &prefix);
                prop_assert!(path.ends_with("/{id:[0-9]+}"), "path {} lacks id suffix", path);
                prop_assert_eq!(path.matches('{').count(), 1);
                prop_assert!(!path.contains("//"));
            }
        }

        #[test]
        fn prop_join_is_normalized(a in "[a-z/]{0,12}", b in "[a-z/]{0,12}") {
            let joined = join_path(&a, &b);
            prop_assert!(joined.starts_with('/'));
            prop_assert!(!joined.contains("//"));
            prop_assert!(joined == "/" || !joined.ends_with('/'));
        }
    }
}
