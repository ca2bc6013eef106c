//! Loading plans
//!
//! A plan is an ordered sequence of steps. Each step is either a single
//! library or a group of libraries loaded concurrently; steps themselves run
//! strictly in the order given. Plans normalize from a bare descriptor, from
//! a list of descriptors, and from declarative JSON/TOML manifests whose
//! steps are a descriptor or an array of descriptors.

use crate::descriptor::LibraryDescriptor;
use crate::error::LoaderError;
use serde::{Deserialize, Serialize};

/// One step of a loading plan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlanStep {
    /// A single library, loaded on its own
    Single(LibraryDescriptor),
    /// Libraries loaded concurrently; the step completes when all have
    /// finished
    Group(Vec<LibraryDescriptor>),
}

impl PlanStep {
    /// The descriptors this step loads, a bare descriptor counting as a
    /// one-element group
    pub fn descriptors(&self) -> &[LibraryDescriptor] {
        match self {
            PlanStep::Single(descriptor) => std::slice::from_ref(descriptor),
            PlanStep::Group(descriptors) => descriptors,
        }
    }
}

impl From<LibraryDescriptor> for PlanStep {
    fn from(descriptor: LibraryDescriptor) -> Self {
        PlanStep::Single(descriptor)
    }
}

impl From<Vec<LibraryDescriptor>> for PlanStep {
    fn from(descriptors: Vec<LibraryDescriptor>) -> Self {
        PlanStep::Group(descriptors)
    }
}

/// Ordered sequence of plan steps
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan {
    pub steps: Vec<PlanStep>,
}

impl Plan {
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Self { steps }
    }

    pub fn push(&mut self, step: impl Into<PlanStep>) {
        self.steps.push(step.into());
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Parse a plan from a JSON manifest
    pub fn from_json_str(manifest: &str) -> Result<Self, LoaderError> {
        serde_json::from_str(manifest)
            .map_err(|e| LoaderError::Config(format!("Invalid JSON plan: {}", e)))
    }

    /// Parse a plan from a TOML manifest with a top-level `steps` array
    pub fn from_toml_str(manifest: &str) -> Result<Self, LoaderError> {
        #[derive(Deserialize)]
        struct Manifest {
            steps: Vec<PlanStep>,
        }
        let parsed: Manifest = toml::from_str(manifest)
            .map_err(|e| LoaderError::Config(format!("Invalid TOML plan: {}", e)))?;
        Ok(Plan::new(parsed.steps))
    }
}

impl From<LibraryDescriptor> for Plan {
    fn from(descriptor: LibraryDescriptor) -> Self {
        Plan::new(vec![PlanStep::Single(descriptor)])
    }
}

impl From<PlanStep> for Plan {
    fn from(step: PlanStep) -> Self {
        Plan::new(vec![step])
    }
}

impl From<Vec<PlanStep>> for Plan {
    fn from(steps: Vec<PlanStep>) -> Self {
        Plan::new(steps)
    }
}

impl From<Vec<LibraryDescriptor>> for Plan {
    fn from(descriptors: Vec<LibraryDescriptor>) -> Self {
        Plan::new(descriptors.into_iter().map(PlanStep::Single).collect())
    }
}
