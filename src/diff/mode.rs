//! Compare modes, line-key schemes and change severity.

use crate::error::{BomError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How two BOMs are lined up and which line attributes are compared.
///
/// | mode          | line key basis            | aggregates | compared props          |
/// |---------------|---------------------------|------------|-------------------------|
/// | `only_product`| child config              | no         | none                    |
/// | `summarized`  | child config              | yes        | quantity, uom           |
/// | `num_qty`     | child config + find + qty | no         | quantity, uom, find_num |
/// | `by_position` | child config + find_num   | no         | quantity, uom, find_num |
/// | `by_reference`| child config + refdes     | no         | quantity, uom, refdes   |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CompareMode {
    #[default]
    OnlyProduct,
    Summarized,
    NumQty,
    ByPosition,
    ByReference,
}

impl CompareMode {
    pub const ALL: [Self; 5] = [
        Self::OnlyProduct,
        Self::Summarized,
        Self::NumQty,
        Self::ByPosition,
        Self::ByReference,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnlyProduct => "only_product",
            Self::Summarized => "summarized",
            Self::NumQty => "num_qty",
            Self::ByPosition => "by_position",
            Self::ByReference => "by_reference",
        }
    }

    /// Parse a mode name; aliases and `-` for `_` are accepted, case-insensitive.
    pub fn parse(name: &str) -> Result<Self> {
        let normalized = name.trim().to_lowercase().replace('-', "_");
        match normalized.as_str() {
            "only_product" | "only" => Ok(Self::OnlyProduct),
            "summarized" | "summary" => Ok(Self::Summarized),
            "num_qty" | "numqty" => Ok(Self::NumQty),
            "by_position" | "by_pos" | "position" => Ok(Self::ByPosition),
            "by_reference" | "by_ref" | "reference" => Ok(Self::ByReference),
            _ => Err(BomError::invalid(format!(
                "compare mode must be one of: only_product, summarized, num_qty, by_position, by_reference (got '{name}')"
            ))),
        }
    }

    #[must_use]
    pub const fn key_scheme(self) -> LineKeyScheme {
        match self {
            Self::OnlyProduct | Self::Summarized => LineKeyScheme::ChildConfig,
            Self::NumQty => LineKeyScheme::ChildConfigFindNumQty,
            Self::ByPosition => LineKeyScheme::ChildConfigFindNum,
            Self::ByReference => LineKeyScheme::ChildConfigRefdes,
        }
    }

    #[must_use]
    pub const fn aggregates(self) -> bool {
        matches!(self, Self::Summarized)
    }

    /// Relationship properties compared when no override is given
    #[must_use]
    pub const fn default_properties(self) -> &'static [&'static str] {
        match self {
            Self::OnlyProduct => &[],
            Self::Summarized => &["quantity", "uom"],
            Self::NumQty | Self::ByPosition => &["quantity", "uom", "find_num"],
            Self::ByReference => &["quantity", "uom", "refdes"],
        }
    }

    /// `only_product` ignores every line attribute: a child present on
    /// both sides is never reported as changed.
    #[must_use]
    pub const fn compares_attributes(self) -> bool {
        !matches!(self, Self::OnlyProduct)
    }
}

impl fmt::Display for CompareMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompareMode {
    type Err = BomError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Composition of a line key. Fields are joined with `::` in a fixed order:
/// parent, child, then find number, reference designators and quantity as
/// the scheme requires. `child_config*` schemes use config ids, falling
/// back to raw ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LineKeyScheme {
    ChildId,
    ChildConfig,
    RelationshipId,
    ChildIdFindNum,
    ChildConfigFindNum,
    ChildIdRefdes,
    ChildConfigRefdes,
    ChildIdFindRefdes,
    ChildConfigFindRefdes,
    ChildIdFindNumQty,
    ChildConfigFindNumQty,
    /// parent config, child config, find_num, refdes, quantity, uom,
    /// effectivity_from, effectivity_to
    LineFull,
}

impl LineKeyScheme {
    pub const ALL: [Self; 12] = [
        Self::ChildId,
        Self::ChildConfig,
        Self::RelationshipId,
        Self::ChildIdFindNum,
        Self::ChildConfigFindNum,
        Self::ChildIdRefdes,
        Self::ChildConfigRefdes,
        Self::ChildIdFindRefdes,
        Self::ChildConfigFindRefdes,
        Self::ChildIdFindNumQty,
        Self::ChildConfigFindNumQty,
        Self::LineFull,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ChildId => "child_id",
            Self::ChildConfig => "child_config",
            Self::RelationshipId => "relationship_id",
            Self::ChildIdFindNum => "child_id_find_num",
            Self::ChildConfigFindNum => "child_config_find_num",
            Self::ChildIdRefdes => "child_id_refdes",
            Self::ChildConfigRefdes => "child_config_refdes",
            Self::ChildIdFindRefdes => "child_id_find_refdes",
            Self::ChildConfigFindRefdes => "child_config_find_refdes",
            Self::ChildIdFindNumQty => "child_id_find_num_qty",
            Self::ChildConfigFindNumQty => "child_config_find_num_qty",
            Self::LineFull => "line_full",
        }
    }

    pub fn parse(name: &str) -> Result<Self> {
        let normalized = name.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|scheme| scheme.as_str() == normalized)
            .ok_or_else(|| BomError::invalid(format!("unknown line key scheme '{name}'")))
    }

    #[must_use]
    pub const fn uses_config(self) -> bool {
        matches!(
            self,
            Self::ChildConfig
                | Self::ChildConfigFindNum
                | Self::ChildConfigRefdes
                | Self::ChildConfigFindRefdes
                | Self::ChildConfigFindNumQty
                | Self::LineFull
        )
    }

    #[must_use]
    pub const fn includes_find_num(self) -> bool {
        matches!(
            self,
            Self::ChildIdFindNum
                | Self::ChildConfigFindNum
                | Self::ChildIdFindRefdes
                | Self::ChildConfigFindRefdes
                | Self::ChildIdFindNumQty
                | Self::ChildConfigFindNumQty
        )
    }

    #[must_use]
    pub const fn includes_refdes(self) -> bool {
        matches!(
            self,
            Self::ChildIdRefdes
                | Self::ChildConfigRefdes
                | Self::ChildIdFindRefdes
                | Self::ChildConfigFindRefdes
        )
    }

    #[must_use]
    pub const fn includes_quantity(self) -> bool {
        matches!(self, Self::ChildIdFindNumQty | Self::ChildConfigFindNumQty)
    }
}

impl fmt::Display for LineKeyScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LineKeyScheme {
    type Err = BomError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Severity of a field change. Ordered `Info < Minor < Major`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Minor,
    Major,
}

impl Severity {
    /// Fixed classification of relationship fields.
    #[must_use]
    pub fn of_field(field: &str) -> Self {
        match field {
            "quantity" | "uom" | "effectivity_from" | "effectivity_to" | "effectivities" => {
                Self::Major
            }
            "find_num" | "refdes" | "substitutes" | "config_condition" => Self::Minor,
            _ => Self::Info,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Minor => "minor",
            Self::Major => "major",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = BomError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "minor" => Ok(Self::Minor),
            "major" => Ok(Self::Major),
            _ => Err(BomError::invalid(format!(
                "severity must be one of: info, minor, major (got '{s}')"
            ))),
        }
    }
}
