use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{io_at, CacheError, CacheResult};
use crate::model::normalize_build_id;
use crate::services::tools::{find_in_path, run_tool};
use crate::services::trace::{SampleSymbol, TraceReader};

/// Magic at the start of a binary record file.
const RECORD_FILE_MAGIC: &[u8; 8] = b"PERFILE2";

#[derive(Debug, Clone, Default)]
struct ParsedSample {
    symbol: Option<SampleSymbol>,
    callchain: Vec<SampleSymbol>,
}

/// Trace reader over the text form of the profiler's `report-sample` output.
///
/// Binary record files are converted by spawning the profiler; any other
/// file is treated as an already dumped report. Build-ids come from
/// `build_id <id>` / `filename <path>` record pairs as printed by `dump`,
/// which may be appended to the same text.
#[derive(Debug, Default)]
pub struct ReportSampleReader {
    simpleperf: Option<PathBuf>,
    samples: Vec<ParsedSample>,
    cursor: usize,
    current: Option<usize>,
    build_ids: HashMap<String, String>,
}

impl ReportSampleReader {
    pub fn new(simpleperf: Option<PathBuf>) -> Self {
        Self { simpleperf, ..Self::default() }
    }

    /// Replace the reader's contents with parsed report text.
    pub fn load_text(&mut self, body: &str) {
        let (samples, build_ids) = parse_report(body);
        self.samples = samples;
        self.build_ids = build_ids;
        self.cursor = 0;
        self.current = None;
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    fn dump_record_file(&self, path: &Path) -> CacheResult<String> {
        let simpleperf =
            self.simpleperf.clone().or_else(|| find_in_path("simpleperf")).ok_or_else(|| {
                CacheError::Tool(
                    "Could not find simpleperf to read a binary record file. Pass --simpleperf"
                        .to_string(),
                )
            })?;

        let mut body = String::new();
        for args in [
            vec![
                OsStr::new("report-sample"),
                OsStr::new("--show-callchain"),
                OsStr::new("-i"),
                path.as_os_str(),
            ],
            vec![OsStr::new("dump"), path.as_os_str()],
        ] {
            let output = run_tool(&simpleperf, &args)?;
            if !output.status.success() {
                return Err(CacheError::Tool(format!(
                    "{} exited with {}",
                    simpleperf.display(),
                    output.status
                )));
            }
            body.push_str(&String::from_utf8_lossy(&output.stdout));
            body.push('\n');
        }
        Ok(body)
    }
}

impl TraceReader for ReportSampleReader {
    fn set_record_file(&mut self, path: &Path) -> CacheResult<()> {
        if !path.is_file() {
            return Err(CacheError::Trace(format!("trace file not found: {}", path.display())));
        }
        let mut magic = [0u8; 8];
        let is_record_file = File::open(path)
            .map_err(io_at(path))?
            .read_exact(&mut magic)
            .is_ok()
            && &magic == RECORD_FILE_MAGIC;

        let body = if is_record_file {
            self.dump_record_file(path)?
        } else {
            let bytes = fs::read(path).map_err(io_at(path))?;
            String::from_utf8_lossy(&bytes).to_string()
        };
        self.load_text(&body);
        debug!(
            "read {} samples and {} build-ids from {}",
            self.samples.len(),
            self.build_ids.len(),
            path.display()
        );
        Ok(())
    }

    fn next_sample(&mut self) -> CacheResult<bool> {
        if self.cursor < self.samples.len() {
            self.current = Some(self.cursor);
            self.cursor += 1;
            Ok(true)
        } else {
            self.current = None;
            Ok(false)
        }
    }

    fn symbol_of_current_sample(&self) -> Option<&SampleSymbol> {
        self.current.and_then(|i| self.samples[i].symbol.as_ref())
    }

    fn callchain_of_current_sample(&self) -> &[SampleSymbol] {
        match self.current {
            Some(i) => &self.samples[i].callchain,
            None => &[],
        }
    }

    fn build_id_for_path(&self, dso_name: &str) -> String {
        self.build_ids.get(dso_name).cloned().unwrap_or_default()
    }
}

fn parse_report(body: &str) -> (Vec<ParsedSample>, HashMap<String, String>) {
    let mut samples = Vec::new();
    let mut build_ids = HashMap::new();
    let mut current: Option<ParsedSample> = None;
    let mut in_callchain = false;
    let mut pending_build_id: Option<String> = None;

    for line in body.lines() {
        let text = line.trim();
        let top_level = !line.starts_with(char::is_whitespace);

        if let Some(id) = text.strip_prefix("build_id ") {
            pending_build_id = Some(normalize_build_id(id));
            continue;
        }
        if let Some(name) = text.strip_prefix("filename ") {
            if let Some(id) = pending_build_id.take() {
                build_ids.entry(name.trim().to_string()).or_insert(id);
            }
            continue;
        }

        if text == "sample:" {
            samples.extend(current.take());
            current = Some(ParsedSample::default());
            in_callchain = false;
            continue;
        }
        if top_level && !text.is_empty() {
            // Any other top-level record ends the open sample.
            samples.extend(current.take());
            in_callchain = false;
            continue;
        }
        let Some(sample) = current.as_mut() else {
            continue;
        };
        if text == "callchain:" {
            in_callchain = true;
        } else if let Some(dso) = text.strip_prefix("file:").map(str::trim) {
            if dso.is_empty() {
                continue;
            }
            if in_callchain {
                sample.callchain.push(SampleSymbol::new(dso));
            } else {
                sample.symbol = Some(SampleSymbol::new(dso));
            }
        } else if let Some(name) = text.strip_prefix("symbol:").map(str::trim) {
            let frame =
                if in_callchain { sample.callchain.last_mut() } else { sample.symbol.as_mut() };
            if let Some(frame) = frame {
                frame.symbol_name = Some(name.to_string());
            }
        }
    }
    samples.extend(current.take());
    (samples, build_ids)
}
