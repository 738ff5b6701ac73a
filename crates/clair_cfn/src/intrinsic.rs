//! Intrinsic expressions: literals, `Ref`, `Fn::GetAtt` and `Fn::Join`.
//!
//! Expressions are symbolic. The provisioning engine resolves them at apply
//! time; the generator only records which entry they point at.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// A property value that may be resolved by the provisioning engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A plain string.
    Literal(String),
    /// `{"Ref": target}`
    Ref(String),
    /// `{"Fn::GetAtt": [target, attribute]}`
    GetAtt(String, String),
    /// `{"Fn::Join": [delimiter, [parts...]]}`
    Join(String, Vec<Expr>),
}

impl Expr {
    pub fn literal(value: impl Into<String>) -> Self {
        Expr::Literal(value.into())
    }

    /// Join parts with an empty delimiter, the common way of composing URLs and ARNs.
    pub fn concat(parts: Vec<Expr>) -> Self {
        Expr::Join(String::new(), parts)
    }

    pub fn join(delimiter: impl Into<String>, parts: Vec<Expr>) -> Self {
        Expr::Join(delimiter.into(), parts)
    }

    /// Logical ids this expression points at, in order of appearance.
    pub fn targets(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_targets(&mut out);
        out
    }

    fn collect_targets<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Ref(target) | Expr::GetAtt(target, _) => out.push(target),
            Expr::Join(_, parts) => {
                for part in parts {
                    part.collect_targets(out);
                }
            }
        }
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Expr::Literal(value.to_string())
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        Expr::Literal(value)
    }
}

impl From<Pseudo> for Expr {
    fn from(value: Pseudo) -> Self {
        value.reference()
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Expr::Literal(value) => serializer.serialize_str(value),
            Expr::Ref(target) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Ref", target)?;
                map.end()
            }
            Expr::GetAtt(target, attribute) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::GetAtt", &[target, attribute])?;
                map.end()
            }
            Expr::Join(delimiter, parts) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::Join", &JoinArgs { delimiter, parts })?;
                map.end()
            }
        }
    }
}

struct JoinArgs<'a> {
    delimiter: &'a str,
    parts: &'a [Expr],
}

impl Serialize for JoinArgs<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(self.delimiter)?;
        seq.serialize_element(self.parts)?;
        seq.end()
    }
}

/// Engine-provided reference targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pseudo {
    AccountId,
    Region,
    Partition,
    StackId,
    StackName,
    UrlSuffix,
    NotificationArns,
    NoValue,
}

impl Pseudo {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pseudo::AccountId => "AWS::AccountId",
            Pseudo::Region => "AWS::Region",
            Pseudo::Partition => "AWS::Partition",
            Pseudo::StackId => "AWS::StackId",
            Pseudo::StackName => "AWS::StackName",
            Pseudo::UrlSuffix => "AWS::URLSuffix",
            Pseudo::NotificationArns => "AWS::NotificationARNs",
            Pseudo::NoValue => "AWS::NoValue",
        }
    }

    pub fn all() -> [Pseudo; 8] {
        [
            Pseudo::AccountId,
            Pseudo::Region,
            Pseudo::Partition,
            Pseudo::StackId,
            Pseudo::StackName,
            Pseudo::UrlSuffix,
            Pseudo::NotificationArns,
            Pseudo::NoValue,
        ]
    }

    pub fn from_str(name: &str) -> Option<Self> {
        Self::all().into_iter().find(|p| p.as_str() == name)
    }

    pub fn reference(&self) -> Expr {
        Expr::Ref(self.as_str().to_string())
    }
}

/// Collect every `Ref` and `Fn::GetAtt` target found in a rendered value.
///
/// Both the list form (`["Id", "Attr"]`) and the dotted string form
/// (`"Id.Attr"`) of `Fn::GetAtt` are understood.
pub fn collect_references(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some(Value::String(target)) = map.get("Ref") {
                    out.push(target.clone());
                    return;
                }
                if let Some(args) = map.get("Fn::GetAtt") {
                    match args {
                        Value::Array(items) => {
                            if let Some(Value::String(target)) = items.first() {
                                out.push(target.clone());
                            }
                        }
                        Value::String(dotted) => {
                            if let Some((target, _)) = dotted.split_once('.') {
                                out.push(target.to_string());
                            }
                        }
                        _ => {}
                    }
                    return;
                }
            }
            for nested in map.values() {
                collect_references(nested, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_references(item, out);
            }
        }
        _ => {}
    }
}
