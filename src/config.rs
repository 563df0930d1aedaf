//! `SolveConfig`: the knobs spec.md §6.2 exposes for `find`/`assert` and
//! their optimisation variants.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which [`symlogic_symbolic::Backend`] a [`crate::Function::find`] call
/// lowers onto.
///
/// Only `Smt` is implemented in this workspace — see `DESIGN.md` for why no
/// BDD backend is grounded in the retrieval pack — but the knob is kept so a
/// `SolveConfig` round-trips through `serde` the way spec.md §6.2 describes,
/// and so a future BDD backend has somewhere to plug in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Smt,
    Bdd,
}

impl Default for BackendKind {
    fn default() -> Self {
        BackendKind::Smt
    }
}

/// Configuration for a `find`/`assert`/`maximize`/`minimize` call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveConfig {
    /// Bound on symbolic `FSeq` length. Must be >= 0.
    pub depth: u32,
    /// Whether generated `FSeq` arguments encompass every length <= `depth`
    /// (`true`) or exactly `depth` (`false`).
    pub check_smaller_depths: bool,
    /// Whether to run local simplifications before interpretation/lowering.
    ///
    /// `symlogic_expr::Builder`'s smart constructors already apply spec
    /// §4.2's peephole simplifications unconditionally at construction
    /// time, so this knob currently has no additional effect; it is kept
    /// so a `SolveConfig` literal matches spec.md §6.2 exactly and so a
    /// future construction-time opt-out has somewhere to read from.
    pub simplify: bool,
    pub backend: BackendKind,
    /// Wall-clock bound for each solver call. `None` means unbounded.
    #[serde(with = "duration_millis_opt")]
    pub timeout: Option<Duration>,
    /// Unroll bound for `Function::compile`.
    pub max_unrolling_depth: u32,
}

impl Default for SolveConfig {
    fn default() -> Self {
        SolveConfig {
            depth: 5,
            check_smaller_depths: true,
            simplify: true,
            backend: BackendKind::Smt,
            timeout: None,
            max_unrolling_depth: 5,
        }
    }
}

mod duration_millis_opt {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        value.map(|d| d.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_spec_documented_defaults() {
        let config = SolveConfig::default();
        assert_eq!(config.depth, 5);
        assert!(config.check_smaller_depths);
        assert!(config.simplify);
        assert_eq!(config.backend, BackendKind::Smt);
        assert_eq!(config.timeout, None);
        assert_eq!(config.max_unrolling_depth, 5);
    }

    #[test]
    fn round_trips_through_json() {
        let config = SolveConfig { depth: 3, timeout: Some(Duration::from_millis(250)), ..SolveConfig::default() };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: SolveConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
