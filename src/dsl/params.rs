//! Parameter resolution for `set` blocks.
//!
//! Each scope has a table of known parameters. A block is checked against
//! its scope's table, values are converted to the declared type, and keys
//! the block leaves out are filled with their defaults. Every value remembers
//! whether it was written in the source or filled in. Blocks merge in source
//! order and the last write of a key wins.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use super::ast::{RawValue, Scope, SetEntry, SetNode};
use super::error::Diagnostic;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Int,
    Float,
    Str,
    Bool,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParamType::Int => "an integer",
            ParamType::Float => "a number",
            ParamType::Str => "a string",
            ParamType::Bool => "true or false",
        })
    }
}

/// A converted parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Str(Cow<'static, str>),
    Bool(bool),
}

impl ParamValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Integers widen to floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(x) => Some(*x),
            ParamValue::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(n) => write!(f, "{n}"),
            ParamValue::Float(x) => write!(f, "{x}"),
            ParamValue::Str(s) => write!(f, "\"{s}\""),
            ParamValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    pub default: ParamValue,
    pub required: bool,
    pub description: &'static str,
}

pub const GLOBAL_PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "BPM",
        ty: ParamType::Float,
        default: ParamValue::Float(120.0),
        required: false,
        description: "tempo in beats per minute",
    },
    ParamSpec {
        name: "volume",
        ty: ParamType::Int,
        default: ParamValue::Int(100),
        required: false,
        description: "default note velocity (0-127)",
    },
    ParamSpec {
        name: "base_duration",
        ty: ParamType::Str,
        default: ParamValue::Str(Cow::Borrowed("1/4")),
        required: false,
        description: "note value used when none is written",
    },
];

/// Shared by tracks and sections.
pub const CONTAINER_PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "channel",
        ty: ParamType::Int,
        default: ParamValue::Int(1),
        required: false,
        description: "MIDI channel (0-15)",
    },
    ParamSpec {
        name: "instrument",
        ty: ParamType::Int,
        default: ParamValue::Int(0),
        required: false,
        description: "instrument id (0-127 General MIDI, 128-132 drum kits)",
    },
    ParamSpec {
        name: "volume",
        ty: ParamType::Int,
        default: ParamValue::Int(100),
        required: false,
        description: "note velocity (0-127)",
    },
];

pub fn specs_for(scope: Scope) -> &'static [ParamSpec] {
    match scope {
        Scope::Global => GLOBAL_PARAMS,
        Scope::Track | Scope::Section => CONTAINER_PARAMS,
    }
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Declared,
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub value: ParamValue,
    pub origin: Origin,
}

/// Resolved parameters of one scope, keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedParams {
    values: BTreeMap<String, Resolved>,
}

impl ResolvedParams {
    pub fn get(&self, key: &str) -> Option<&Resolved> {
        self.values.get(key)
    }

    /// The value of `key`, whatever its origin.
    pub fn value(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key).map(|r| &r.value)
    }

    /// The value of `key` only if a `set` block wrote it.
    pub fn declared(&self, key: &str) -> Option<&ParamValue> {
        self.values
            .get(key)
            .filter(|r| r.origin == Origin::Declared)
            .map(|r| &r.value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Resolved)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Layer `later` over `self`. Every key in `later` replaces the earlier
    /// value, filled-in defaults included.
    pub fn merge(&mut self, later: ResolvedParams) {
        self.values.extend(later.values);
    }

    fn insert(&mut self, key: &str, value: ParamValue, origin: Origin) {
        self.values
            .insert(key.to_string(), Resolved { value, origin });
    }
}

/// Resolve one block against its own scope's table.
pub fn resolve_set(set: &SetNode) -> (ResolvedParams, Vec<Diagnostic>) {
    resolve_with(set, specs_for(set.scope))
}

/// Resolve one block against `specs`. Entries that fail are reported and
/// left out; the rest of the block still resolves.
pub fn resolve_with(set: &SetNode, specs: &[ParamSpec]) -> (ResolvedParams, Vec<Diagnostic>) {
    let mut params = ResolvedParams::default();
    let mut diagnostics = Vec::new();

    for entry in &set.entries {
        let Some(spec) = specs.iter().find(|s| s.name == entry.key) else {
            diagnostics.push(Diagnostic::at(
                format!("unknown {} parameter '{}'", set.scope, entry.key),
                entry.pos,
            ));
            continue;
        };
        match convert(entry, spec.ty) {
            Ok(value) => params.insert(spec.name, value, Origin::Declared),
            Err(d) => diagnostics.push(d),
        }
    }

    for spec in specs {
        if params.get(spec.name).is_some() {
            continue;
        }
        let declared_but_invalid = set.entries.iter().any(|e| e.key == spec.name);
        if spec.required && !declared_but_invalid {
            diagnostics.push(Diagnostic::at(
                format!("missing required {} parameter '{}'", set.scope, spec.name),
                set.pos,
            ));
        } else if !declared_but_invalid {
            params.insert(spec.name, spec.default.clone(), Origin::Default);
        }
    }

    (params, diagnostics)
}

/// Resolve every block and merge them in source order.
pub fn resolve_blocks(sets: &[SetNode]) -> (ResolvedParams, Vec<Diagnostic>) {
    let mut merged = ResolvedParams::default();
    let mut diagnostics = Vec::new();
    for set in sets {
        let (params, mut errs) = resolve_set(set);
        merged.merge(params);
        diagnostics.append(&mut errs);
    }
    (merged, diagnostics)
}

fn convert(entry: &SetEntry, ty: ParamType) -> Result<ParamValue, Diagnostic> {
    let mismatch = || {
        Diagnostic::at(
            format!(
                "parameter '{}' must be {ty}, got '{}'",
                entry.key, entry.value
            ),
            entry.pos,
        )
    };

    match (ty, &entry.value) {
        (_, RawValue::Fraction { den: 0, .. }) => Err(Diagnostic::at(
            format!("parameter '{}' has a zero denominator", entry.key),
            entry.pos,
        )),
        (ParamType::Int, RawValue::Integer(n)) => {
            i64::try_from(*n).map(ParamValue::Int).map_err(|_| mismatch())
        }
        (ParamType::Float, RawValue::Integer(n)) => Ok(ParamValue::Float(*n as f64)),
        (ParamType::Float, RawValue::Fraction { num, den }) => {
            Ok(ParamValue::Float(*num as f64 / *den as f64))
        }
        (ParamType::Str, value) => Ok(ParamValue::Str(Cow::Owned(value.to_string()))),
        (ParamType::Bool, RawValue::Ident(word)) => match word.as_str() {
            "true" => Ok(ParamValue::Bool(true)),
            "false" => Ok(ParamValue::Bool(false)),
            _ => Err(mismatch()),
        },
        _ => Err(mismatch()),
    }
}
