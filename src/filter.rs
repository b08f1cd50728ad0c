//! Typed APRS-IS server-side filter expressions, for composing the login
//! filter string. Unknown tokens are preserved verbatim so a round trip
//! never loses information.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A whole filter string: space-separated terms, each optionally negated
/// with a leading `-`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterExpr {
    pub terms: Vec<FilterTerm>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterTerm {
    pub negated: bool,
    pub filter: Filter,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `r/<lat>/<lon>/<km>` (range around a point).
    Range { lat: f64, lon: f64, km: f64 },
    /// `a/<lat1>/<lon1>/<lat2>/<lon2>` (bounding box).
    Area {
        lat1: f64,
        lon1: f64,
        lat2: f64,
        lon2: f64,
    },
    /// `b/<call>/...` (budlist, wildcards allowed).
    Budlist(Vec<String>),
    /// `p/<prefix>/...` (callsign prefixes).
    Prefixes(Vec<String>),
    /// `t/<letters>` (packet type set, e.g. `t/poimqstunw`).
    Types(String),
    /// `s/<table>/<code>` (symbol filter).
    Symbol(String, String),
    /// `u/<prefix>/...` (TO-field prefixes).
    ToPrefixes(Vec<String>),
    /// `e/<call>/...` (entry/igate stations).
    Entry(Vec<String>),
    /// `g/<group>` (group, e.g. `g/ALL`).
    Group(String),
    /// `m/<km>` (range around the logged-in station).
    MyRange(f64),
    /// Anything this module does not model, kept as-is.
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterParseError {
    pub token: String,
    pub reason: String,
}

impl Display for FilterParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "bad filter term \"{}\": {}", self.token, self.reason)
    }
}

impl std::error::Error for FilterParseError {}

impl FromStr for FilterExpr {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut terms = Vec::new();
        for token in s.split_whitespace() {
            let (negated, body) = match token.strip_prefix('-') {
                Some(stripped) => (true, stripped),
                None => (false, token),
            };
            terms.push(FilterTerm {
                negated,
                filter: parse_term(body).map_err(|reason| FilterParseError {
                    token: token.to_string(),
                    reason,
                })?,
            });
        }
        Ok(FilterExpr { terms })
    }
}

fn parse_term(body: &str) -> Result<Filter, String> {
    let Some((tag, rest)) = body.split_once('/') else {
        return Ok(Filter::Other(body.to_string()));
    };
    match tag {
        "r" => {
            let v = floats(rest, 3)?;
            check_point(v[0], v[1])?;
            if v[2] < 0.0 {
                return Err("range must be non-negative".into());
            }
            Ok(Filter::Range {
                lat: v[0],
                lon: v[1],
                km: v[2],
            })
        }
        "a" => {
            let v = floats(rest, 4)?;
            check_point(v[0], v[1])?;
            check_point(v[2], v[3])?;
            Ok(Filter::Area {
                lat1: v[0],
                lon1: v[1],
                lat2: v[2],
                lon2: v[3],
            })
        }
        "b" => Ok(Filter::Budlist(list(rest))),
        "p" => Ok(Filter::Prefixes(list(rest))),
        "t" => Ok(Filter::Types(rest.to_string())),
        "s" => {
            let (table, code) = rest.split_once('/').unwrap_or((rest, ""));
            Ok(Filter::Symbol(table.to_string(), code.to_string()))
        }
        "u" => Ok(Filter::ToPrefixes(list(rest))),
        "e" => Ok(Filter::Entry(list(rest))),
        "g" => Ok(Filter::Group(rest.to_string())),
        "m" => {
            let km: f64 = rest.parse().map_err(|_| format!("not a number: {rest}"))?;
            Ok(Filter::MyRange(km))
        }
        _ => Ok(Filter::Other(body.to_string())),
    }
}

fn floats(rest: &str, expected: usize) -> Result<Vec<f64>, String> {
    let values: Vec<f64> = rest
        .split('/')
        .map(|p| p.parse::<f64>().map_err(|_| format!("not a number: {p}")))
        .collect::<Result<_, _>>()?;
    if values.len() != expected {
        return Err(format!("expected {expected} parts, got {}", values.len()));
    }
    Ok(values)
}

fn list(rest: &str) -> Vec<String> {
    rest.split('/')
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn check_point(lat: f64, lon: f64) -> Result<(), String> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(format!("latitude out of range: {lat}"));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(format!("longitude out of range: {lon}"));
    }
    Ok(())
}

impl Display for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Filter::Range { lat, lon, km } => write!(f, "r/{lat}/{lon}/{km}"),
            Filter::Area {
                lat1,
                lon1,
                lat2,
                lon2,
            } => write!(f, "a/{lat1}/{lon1}/{lat2}/{lon2}"),
            Filter::Budlist(calls) => write!(f, "b/{}", calls.join("/")),
            Filter::Prefixes(prefixes) => write!(f, "p/{}", prefixes.join("/")),
            Filter::Types(letters) => write!(f, "t/{letters}"),
            Filter::Symbol(table, code) if code.is_empty() => write!(f, "s/{table}"),
            Filter::Symbol(table, code) => write!(f, "s/{table}/{code}"),
            Filter::ToPrefixes(prefixes) => write!(f, "u/{}", prefixes.join("/")),
            Filter::Entry(calls) => write!(f, "e/{}", calls.join("/")),
            Filter::Group(group) => write!(f, "g/{group}"),
            Filter::MyRange(km) => write!(f, "m/{km}"),
            Filter::Other(token) => write!(f, "{token}"),
        }
    }
}

impl Display for FilterExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for term in &self.terms {
            if !first {
                write!(f, " ")?;
            }
            if term.negated {
                write!(f, "-")?;
            }
            write!(f, "{}", term.filter)?;
            first = false;
        }
        Ok(())
    }
}
