#![warn(missing_docs)]
//! PinBench Engines - Concrete Engine Adapters
//!
//! One `EngineAdapter` per supported inference framework:
//! - Forclift (`.mln`, weighted model counting, all-marginals combined mode)
//! - Alchemy (`.mln`, lifted importance / Gibbs sampling, Linux only)
//! - GC-FOVE (`.blog`, lifted variable elimination)
//! - JT (`.blog`, lifted junction trees and their VE baselines)
//! - BLOG (`.blog`, sampling, combined mode only)
//!
//! Use [`build_adapter`] to select one at startup.

mod alchemy;
mod blog;
mod forclift;
mod gcfove;
mod jt;
pub mod text;

pub use alchemy::{ALCHEMY_EXECUTABLE, AlchemyAdapter};
pub use blog::{BLOG_ENGINE_DIR, BlogAdapter};
pub use forclift::{FORCLIFT_JAR, ForcliftAdapter};
pub use gcfove::{GCFOVE_JAR, GcFoveAdapter};
pub use jt::{JT_JAR, JtAdapter};

use pinbench_core::{AdapterError, EngineAdapter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Supported benchmark frameworks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    /// Forclift
    Forclift,
    /// GC-FOVE
    Gcfove,
    /// Lifted junction tree
    Jt,
    /// Alchemy lifted inference
    Alchemy,
    /// BLOG sampling engine
    Blog,
}

impl Framework {
    /// All frameworks, in CLI order.
    pub const ALL: [Framework; 5] = [
        Framework::Forclift,
        Framework::Gcfove,
        Framework::Jt,
        Framework::Alchemy,
        Framework::Blog,
    ];

    /// Lowercase CLI name.
    pub fn as_str(self) -> &'static str {
        match self {
            Framework::Forclift => "forclift",
            Framework::Gcfove => "gcfove",
            Framework::Jt => "jt",
            Framework::Alchemy => "alchemy",
            Framework::Blog => "blog",
        }
    }

    /// Executable or jar used when no override is configured.
    pub fn default_executable(self) -> &'static str {
        match self {
            Framework::Forclift => FORCLIFT_JAR,
            Framework::Gcfove => GCFOVE_JAR,
            Framework::Jt => JT_JAR,
            Framework::Alchemy => ALCHEMY_EXECUTABLE,
            Framework::Blog => BLOG_ENGINE_DIR,
        }
    }

    /// Engine used when none is requested.
    pub fn default_engine(self) -> Option<InferenceEngine> {
        match self {
            Framework::Gcfove => Some(InferenceEngine::LiftedVarElim),
            Framework::Jt => Some(InferenceEngine::LiftedJt),
            Framework::Alchemy => Some(InferenceEngine::Ptpe),
            Framework::Forclift | Framework::Blog => None,
        }
    }

    /// Engines this framework accepts.
    pub fn engines(self) -> &'static [InferenceEngine] {
        use InferenceEngine::*;
        match self {
            Framework::Gcfove => &[LiftedVarElim, VarElim],
            Framework::Jt => &[LiftedJt, Jt, LiftedVarElim, VarElim],
            Framework::Alchemy => &[Ptpe, Lis, Lvg],
            Framework::Forclift | Framework::Blog => &[],
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Framework {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Framework::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown framework '{s}'"))
    }
}

/// Inference engines selectable with `--engine`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InferenceEngine {
    /// `fove.LiftedVarElim`
    #[serde(rename = "fove.LiftedVarElim")]
    LiftedVarElim,
    /// `ve.VarElimEngine`
    #[serde(rename = "ve.VarElimEngine")]
    VarElim,
    /// `fojt.LiftedJTEngine`
    #[serde(rename = "fojt.LiftedJTEngine")]
    LiftedJt,
    /// `jt.JTEngine`
    #[serde(rename = "jt.JTEngine")]
    Jt,
    /// Alchemy exact lifted model counting
    #[serde(rename = "ptpe")]
    Ptpe,
    /// Alchemy lifted importance sampling
    #[serde(rename = "lis")]
    Lis,
    /// Alchemy lifted blocked Gibbs sampling
    #[serde(rename = "lvg")]
    Lvg,
}

impl InferenceEngine {
    /// All engines, in CLI order.
    pub const ALL: [InferenceEngine; 7] = [
        InferenceEngine::LiftedVarElim,
        InferenceEngine::VarElim,
        InferenceEngine::LiftedJt,
        InferenceEngine::Jt,
        InferenceEngine::Ptpe,
        InferenceEngine::Lis,
        InferenceEngine::Lvg,
    ];

    /// Name passed to the engine on its command line.
    pub fn as_arg(self) -> &'static str {
        match self {
            InferenceEngine::LiftedVarElim => "fove.LiftedVarElim",
            InferenceEngine::VarElim => "ve.VarElimEngine",
            InferenceEngine::LiftedJt => "fojt.LiftedJTEngine",
            InferenceEngine::Jt => "jt.JTEngine",
            InferenceEngine::Ptpe => "ptpe",
            InferenceEngine::Lis => "lis",
            InferenceEngine::Lvg => "lvg",
        }
    }

    /// Short label used in output file tags.
    pub fn short(self) -> &'static str {
        match self {
            InferenceEngine::LiftedVarElim => "LVE",
            InferenceEngine::VarElim => "VE",
            InferenceEngine::LiftedJt => "LJT",
            InferenceEngine::Jt => "JT",
            InferenceEngine::Ptpe => "ptpe",
            InferenceEngine::Lis => "lis",
            InferenceEngine::Lvg => "lvg",
        }
    }
}

impl fmt::Display for InferenceEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_arg())
    }
}

impl FromStr for InferenceEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InferenceEngine::ALL
            .into_iter()
            .find(|e| e.as_arg() == s)
            .ok_or_else(|| format!("unknown inference engine '{s}'"))
    }
}

/// Construct the adapter for `framework`.
///
/// `engine` falls back to the framework default; engines the framework does
/// not know are rejected. `executable` overrides the default jar / binary path.
pub fn build_adapter(
    framework: Framework,
    engine: Option<InferenceEngine>,
    executable: Option<PathBuf>,
) -> Result<Arc<dyn EngineAdapter>, AdapterError> {
    let executable =
        executable.unwrap_or_else(|| PathBuf::from(framework.default_executable()));

    let engine = match (engine, framework.default_engine()) {
        (Some(engine), Some(_)) if !framework.engines().contains(&engine) => {
            return Err(AdapterError::InvalidEngine {
                framework: framework.to_string(),
                engine: engine.to_string(),
            });
        }
        (Some(engine), Some(_)) => Some(engine),
        (Some(engine), None) => {
            info!("{framework} has a single inference engine, ignoring '{engine}'");
            None
        }
        (None, default) => default,
    };

    let adapter: Arc<dyn EngineAdapter> = match (framework, engine) {
        (Framework::Forclift, _) => Arc::new(ForcliftAdapter::new(executable)),
        (Framework::Blog, _) => Arc::new(BlogAdapter::new(executable)),
        (Framework::Gcfove, Some(engine)) => Arc::new(GcFoveAdapter::new(executable, engine)),
        (Framework::Jt, Some(engine)) => Arc::new(JtAdapter::new(executable, engine)),
        (Framework::Alchemy, Some(engine)) => Arc::new(AlchemyAdapter::new(executable, engine)),
        (framework, None) => {
            return Err(AdapterError::InvalidEngine {
                framework: framework.to_string(),
                engine: "<none>".to_string(),
            });
        }
    };
    Ok(adapter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_per_framework() {
        let adapter = build_adapter(Framework::Jt, None, None).unwrap();
        assert_eq!(adapter.tag(), "JT_LJT");
        assert_eq!(adapter.executable(), std::path::Path::new("fojt.jar"));

        let adapter = build_adapter(Framework::Gcfove, None, None).unwrap();
        assert_eq!(adapter.tag(), "gcfove_LVE");

        let adapter = build_adapter(Framework::Alchemy, None, None).unwrap();
        assert_eq!(adapter.inference_engine(), Some("ptpe"));
    }

    #[test]
    fn engine_must_belong_to_framework() {
        let err = build_adapter(Framework::Gcfove, Some(InferenceEngine::Lis), None)
            .err()
            .unwrap();
        assert!(matches!(err, AdapterError::InvalidEngine { .. }));

        assert!(build_adapter(Framework::Jt, Some(InferenceEngine::VarElim), None).is_ok());
    }

    #[test]
    fn single_engine_frameworks_ignore_engine() {
        let adapter =
            build_adapter(Framework::Blog, Some(InferenceEngine::Ptpe), None).unwrap();
        assert_eq!(adapter.tag(), "blog_SamplingEngine");
    }

    #[test]
    fn executable_override() {
        let adapter =
            build_adapter(Framework::Forclift, None, Some("/opt/forclift.jar".into())).unwrap();
        assert_eq!(adapter.executable(), std::path::Path::new("/opt/forclift.jar"));
    }

    #[test]
    fn names_round_trip_through_from_str() {
        assert_eq!("gcfove".parse::<Framework>(), Ok(Framework::Gcfove));
        assert_eq!(
            "fojt.LiftedJTEngine".parse::<InferenceEngine>(),
            Ok(InferenceEngine::LiftedJt)
        );
        assert!("nope".parse::<Framework>().is_err());
    }
}
