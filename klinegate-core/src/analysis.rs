use async_trait::async_trait;
use klinegate_types::{AnalysisConfig, AnnotatedBar, BarSequence, KlineError};

/// The external engine that appends fractal, stroke and segment markers.
///
/// klinegate treats it as a black box: it receives the canonical sequence and
/// the configured parameters and returns the same bars, in the same order,
/// with marker cells filled where the engine found something.
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    /// Identifier used in logs.
    fn name(&self) -> &'static str;

    /// Annotate `bars`.
    ///
    /// # Errors
    /// Returns `Analysis` when the engine fails; the message is passed through unchanged.
    async fn annotate(
        &self,
        bars: BarSequence,
        config: &AnalysisConfig,
    ) -> Result<Vec<AnnotatedBar>, KlineError>;
}

/// Engine that produces no markers; it only honors `max_count`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainEngine;

#[async_trait]
impl AnalysisEngine for PlainEngine {
    fn name(&self) -> &'static str {
        "plain"
    }

    async fn annotate(
        &self,
        mut bars: BarSequence,
        config: &AnalysisConfig,
    ) -> Result<Vec<AnnotatedBar>, KlineError> {
        bars.keep_last(config.max_count);
        Ok(bars.into_inner().into_iter().map(AnnotatedBar::plain).collect())
    }
}
