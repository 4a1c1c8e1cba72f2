//! External analysis engine driven over stdin/stdout.
//!
//! The child process receives one JSON document on stdin:
//!
//! ```json
//! {"config": {"ma_params": [5, 20], "use_macd": true, "use_xd": true, "max_count": 5000},
//!  "bars": [{"symbol": "000001.SH", "dt": "2020-07-20 00:00:00",
//!            "open": 3219.41, "close": 3314.15, "high": 3314.68, "low": 3219.41, "vol": 4.142e10}]}
//! ```
//!
//! and must print `{"bars": [{"dt": ..., "fx_mark": ..., "fx": ..., "bi": ..., "xd": ...}]}`
//! covering the newest bars it kept, oldest first, or `{"error": "..."}`.

use std::collections::HashMap;
use std::process::Stdio;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use klinegate_core::{
    AnalysisConfig, AnalysisEngine, AnnotatedBar, Bar, BarSequence, DT_FORMAT, KlineError,
};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Serialize)]
struct EngineBar<'a> {
    symbol: &'a str,
    dt: String,
    open: f64,
    close: f64,
    high: f64,
    low: f64,
    vol: f64,
}

impl<'a> From<&'a Bar> for EngineBar<'a> {
    fn from(b: &'a Bar) -> Self {
        let f = |d: rust_decimal::Decimal| d.to_string().parse::<f64>().unwrap_or(f64::NAN);
        Self {
            symbol: &b.symbol,
            dt: b.dt.format(DT_FORMAT).to_string(),
            open: f(b.open),
            close: f(b.close),
            high: f(b.high),
            low: f(b.low),
            vol: f(b.vol),
        }
    }
}

#[derive(Serialize)]
struct EngineInput<'a> {
    config: &'a AnalysisConfig,
    bars: Vec<EngineBar<'a>>,
}

#[derive(Deserialize)]
struct Marked {
    dt: String,
    #[serde(default)]
    fx_mark: Option<String>,
    #[serde(default)]
    fx: Option<f64>,
    #[serde(default)]
    bi: Option<f64>,
    #[serde(default)]
    xd: Option<f64>,
}

#[derive(Deserialize)]
struct EngineOutput {
    #[serde(default)]
    bars: Vec<Marked>,
    #[serde(default)]
    error: Option<String>,
}

/// Runs an external program per request.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
}

impl CommandEngine {
    /// Engine from an argv list; the first entry is the program.
    ///
    /// # Errors
    /// `Analysis` when `argv` is empty.
    pub fn from_argv(argv: &[String]) -> Result<Self, KlineError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| KlineError::Analysis("analysis.command is empty".into()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    async fn run(&self, input: Vec<u8>) -> Result<Vec<u8>, KlineError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| KlineError::Analysis(format!("spawn {}: {e}", self.program)))?;
        // Written from a task: the child may fill stdout before draining stdin.
        let writer = child.stdin.take().map(|mut stdin| {
            tokio::spawn(async move {
                let res = stdin.write_all(&input).await;
                drop(stdin);
                res
            })
        });
        let out = child
            .wait_with_output()
            .await
            .map_err(|e| KlineError::Analysis(format!("wait for engine: {e}")))?;
        let written = match writer {
            Some(task) => task
                .await
                .map_err(|e| KlineError::Analysis(format!("engine stdin task: {e}")))?,
            None => Ok(()),
        };
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(KlineError::Analysis(format!(
                "engine exited with {}: {}",
                out.status,
                stderr.trim()
            )));
        }
        written.map_err(|e| KlineError::Analysis(format!("write to engine: {e}")))?;
        Ok(out.stdout)
    }
}

fn parse_dt(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DT_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

#[async_trait]
impl AnalysisEngine for CommandEngine {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn annotate(
        &self,
        bars: BarSequence,
        config: &AnalysisConfig,
    ) -> Result<Vec<AnnotatedBar>, KlineError> {
        let input = EngineInput {
            config,
            bars: bars.iter().map(EngineBar::from).collect(),
        };
        let payload = serde_json::to_vec(&input)
            .map_err(|e| KlineError::Analysis(format!("encode engine input: {e}")))?;
        let stdout = self.run(payload).await?;
        let output: EngineOutput = serde_json::from_slice(&stdout)
            .map_err(|e| KlineError::Analysis(format!("decode engine output: {e}")))?;
        if let Some(msg) = output.error {
            return Err(KlineError::Analysis(msg));
        }

        let mut by_dt: HashMap<NaiveDateTime, Bar> =
            bars.into_inner().into_iter().map(|b| (b.dt, b)).collect();
        let mut out = Vec::with_capacity(output.bars.len());
        let mut last: Option<NaiveDateTime> = None;
        for m in output.bars {
            let dt = parse_dt(&m.dt)
                .ok_or_else(|| KlineError::Analysis(format!("engine returned dt '{}'", m.dt)))?;
            if last.is_some_and(|prev| prev >= dt) {
                return Err(KlineError::Analysis(format!(
                    "engine output out of order at {}",
                    m.dt
                )));
            }
            last = Some(dt);
            let bar = by_dt
                .remove(&dt)
                .ok_or_else(|| KlineError::Analysis(format!("engine invented bar at {}", m.dt)))?;
            out.push(AnnotatedBar {
                bar,
                fx_mark: m.fx_mark.filter(|s| !s.is_empty()),
                fx: m.fx,
                bi: m.bi,
                xd: m.xd,
            });
        }
        Ok(out)
    }
}
