//! Pipeline Runner: times each generation step and fingerprints artifacts
use crate::data_model::{ArtifactProof, StepProof};
use std::time::Instant;

pub struct PipelineRunner {
    pipeline_id: String,
    steps: Vec<StepProof>,
}

impl PipelineRunner {
    pub fn new(pipeline_id: impl Into<String>) -> Self {
        Self {
            pipeline_id: pipeline_id.into(),
            steps: Vec::new(),
        }
    }

    /// Run one step, recording its latency whether it succeeds or not.
    pub fn step<T, E>(
        &mut self,
        id: &str,
        f: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        let start = Instant::now();
        let result = f();
        let latency_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            pipeline = %self.pipeline_id,
            step = id,
            latency_ms,
            ok = result.is_ok(),
            "step finished"
        );
        self.steps.push(StepProof {
            id: id.to_string(),
            latency_ms,
            ok: result.is_ok(),
        });

        result
    }

    pub fn artifact(&self, path: &str, data: &[u8]) -> ArtifactProof {
        ArtifactProof {
            path: path.to_string(),
            hash: fingerprint(data),
            bytes: data.len(),
        }
    }

    pub fn pipeline_id(&self) -> &str {
        &self.pipeline_id
    }

    pub fn into_steps(self) -> Vec<StepProof> {
        self.steps
    }
}

pub fn fingerprint(data: &[u8]) -> String {
    format!("blake3:{}", blake3::hash(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_are_recorded_in_order() {
        let mut runner = PipelineRunner::new("parse→build");
        let value: Result<u32, String> = runner.step("parse", || Ok(1));
        assert_eq!(value.unwrap(), 1);
        let failed: Result<u32, String> = runner.step("build", || Err("boom".into()));
        assert!(failed.is_err());

        let steps = runner.into_steps();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].id, "parse");
        assert!(steps[0].ok);
        assert!(!steps[1].ok);
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let runner = PipelineRunner::new("emit");
        let a = runner.artifact("a.h", b"#define X 1\n");
        let b = runner.artifact("b.h", b"#define X 1\n");
        assert_eq!(a.hash, b.hash);
        assert!(a.hash.starts_with("blake3:"));
        assert_eq!(a.bytes, 12);
    }
}
