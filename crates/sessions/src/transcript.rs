//! Append-only JSONL transcripts.
//!
//! Each chat session gets a `<session_id>.jsonl` file under the transcript
//! directory. Every turn appended to the conversation is mirrored as a
//! single JSON line. The file is the only copy; reads go to disk.

use std::path::{Path, PathBuf};

use chrono::Utc;
use pa_domain::error::{Error, Result};
use pa_domain::trace::TraceEvent;
use serde::{Deserialize, Serialize};

/// A single transcript line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptLine {
    pub timestamp: String,
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Writes append-only JSONL transcript files.
pub struct TranscriptWriter {
    base_dir: PathBuf,
}

impl TranscriptWriter {
    pub fn new(base_dir: &Path) -> Self {
        Self { base_dir: base_dir.to_path_buf() }
    }

    /// Path of the transcript file for `session_id`.
    pub fn path_for(&self, session_id: &str) -> PathBuf {
        self.base_dir.join(format!("{session_id}.jsonl"))
    }

    /// Append one or more lines to a session's transcript.
    pub fn append(&self, session_id: &str, lines: &[TranscriptLine]) -> Result<()> {
        if lines.is_empty() {
            return Ok(());
        }

        self.write_to_disk(session_id, lines)?;

        TraceEvent::TranscriptAppend {
            session_id: session_id.to_owned(),
            lines: lines.len(),
        }
        .emit();

        Ok(())
    }

    /// Helper to create a transcript line with the current timestamp.
    pub fn line(role: &str, content: &str) -> TranscriptLine {
        TranscriptLine {
            timestamp: Utc::now().to_rfc3339(),
            role: role.to_owned(),
            content: content.to_owned(),
            metadata: None,
        }
    }

    /// Read back a transcript from disk. Malformed lines are skipped.
    pub fn read(&self, session_id: &str) -> Result<Vec<TranscriptLine>> {
        read_jsonl_file(&self.path_for(session_id), session_id)
    }

    // ── Private helpers ───────────────────────────────────────────────

    fn write_to_disk(&self, session_id: &str, lines: &[TranscriptLine]) -> Result<()> {
        use std::io::Write;

        std::fs::create_dir_all(&self.base_dir)?;
        let buf = serialize_lines(lines)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(session_id))
            .map_err(Error::Io)?;
        file.write_all(buf.as_bytes()).map_err(Error::Io)?;
        Ok(())
    }
}

/// Serialize transcript lines to a JSONL string.
fn serialize_lines(lines: &[TranscriptLine]) -> Result<String> {
    let mut buf = String::new();
    for line in lines {
        let json = serde_json::to_string(line)
            .map_err(|e| Error::Other(format!("serializing transcript line: {e}")))?;
        buf.push_str(&json);
        buf.push('\n');
    }
    Ok(buf)
}

/// Read and parse a JSONL transcript file.
fn read_jsonl_file(path: &Path, session_id: &str) -> Result<Vec<TranscriptLine>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let raw = std::fs::read_to_string(path).map_err(Error::Io)?;
    let mut lines = Vec::new();
    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<TranscriptLine>(line) {
            Ok(tl) => lines.push(tl),
            Err(e) => {
                tracing::warn!(
                    session_id = session_id,
                    error = %e,
                    "skipping malformed transcript line"
                );
            }
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_creates_directory_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TranscriptWriter::new(&dir.path().join("transcripts"));
        writer
            .append(
                "s1",
                &[TranscriptWriter::line("user", "hi"), TranscriptWriter::line("assistant", "hello")],
            )
            .unwrap();

        let raw = std::fs::read_to_string(writer.path_for("s1")).unwrap();
        assert_eq!(raw.lines().count(), 2);

        let lines = writer.read("s1").unwrap();
        assert_eq!(lines[1].content, "hello");
    }

    #[test]
    fn read_sees_lines_written_by_another_writer() {
        let dir = tempfile::tempdir().unwrap();
        let first = TranscriptWriter::new(dir.path());
        let second = TranscriptWriter::new(dir.path());

        first.append("s3", &[TranscriptWriter::line("user", "one")]).unwrap();
        assert_eq!(second.read("s3").unwrap().len(), 1);

        first.append("s3", &[TranscriptWriter::line("assistant", "two")]).unwrap();
        let lines = second.read("s3").unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].content, "two");
    }

    #[test]
    fn read_skips_malformed_lines_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let good = serde_json::to_string(&TranscriptWriter::line("user", "ok")).unwrap();
        std::fs::write(dir.path().join("s2.jsonl"), format!("{good}\nnot json\n\n")).unwrap();

        let writer = TranscriptWriter::new(dir.path());
        let lines = writer.read("s2").unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].role, "user");
    }

    #[test]
    fn missing_transcript_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TranscriptWriter::new(dir.path());
        assert!(writer.read("nope").unwrap().is_empty());
        writer.append("nope", &[]).unwrap();
        assert!(!writer.path_for("nope").exists());
    }
}
